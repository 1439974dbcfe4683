use std::sync::atomic::{AtomicU8, Ordering};

/// Where a resource is in its streaming lifecycle.
///
/// The streamer is the only writer. A commit moves a resource to `Loading`, and the dispatch
/// stage moves it to `Loaded` (or `Failed` if the renderer backend could not take the data).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum LoadState {
    // Never requested, or requested and since evicted by the owner
    Unloaded = 0,
    // A load request is queued or being worked on by one of the stages
    Loading = 1,
    // Dispatched to the renderer backend, usable by the render thread
    Loaded = 2,
    // Dispatch to the renderer backend failed. Can be committed again.
    Failed = 3,
}

impl LoadState {
    fn from_u8(value: u8) -> LoadState {
        match value {
            1 => LoadState::Loading,
            2 => LoadState::Loaded,
            3 => LoadState::Failed,
            _ => LoadState::Unloaded,
        }
    }

    pub fn is_loading(self) -> bool {
        self == LoadState::Loading
    }

    pub fn is_loaded(self) -> bool {
        self == LoadState::Loaded
    }

    /// True once the most recent load has finished, successfully or not
    pub fn is_settled(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Failed)
    }
}

impl Default for LoadState {
    fn default() -> Self {
        LoadState::Unloaded
    }
}

/// Lock-free storage for a [`LoadState`], embedded in every streamable resource.
///
/// Readers on other threads may observe a stale value, they should poll. After construction the
/// state only changes through `begin_loading` and `finish_loading`.
#[derive(Debug, Default)]
pub struct LoadStateCell(AtomicU8);

impl LoadStateCell {
    pub fn new(state: LoadState) -> Self {
        LoadStateCell(AtomicU8::new(state as u8))
    }

    pub fn get(&self) -> LoadState {
        LoadState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves the cell to `Loading` unless it is already there. Returns the previous state on
    /// success, or `Err(LoadState::Loading)` if a load is already in flight.
    pub fn begin_loading(&self) -> Result<LoadState, LoadState> {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if LoadState::from_u8(current) == LoadState::Loading {
                return Err(LoadState::Loading);
            }

            match self.0.compare_exchange_weak(
                current,
                LoadState::Loading as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => return Ok(LoadState::from_u8(previous)),
                Err(actual) => current = actual,
            }
        }
    }

    /// Moves the cell from `Loading` to `finished`. Returns false (and leaves the cell alone) if
    /// the cell was not `Loading`, which would mean someone else wrote the state mid-flight.
    pub fn finish_loading(
        &self,
        finished: LoadState,
    ) -> bool {
        debug_assert!(finished.is_settled());
        self.0
            .compare_exchange(
                LoadState::Loading as u8,
                finished as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_unloaded() {
        let cell = LoadStateCell::default();
        assert_eq!(cell.get(), LoadState::Unloaded);
    }

    #[test]
    fn begin_loading_rejects_in_flight() {
        let cell = LoadStateCell::default();
        assert_eq!(cell.begin_loading(), Ok(LoadState::Unloaded));
        assert_eq!(cell.get(), LoadState::Loading);
        assert_eq!(cell.begin_loading(), Err(LoadState::Loading));
    }

    #[test]
    fn reload_after_settle() {
        let cell = LoadStateCell::new(LoadState::Loaded);
        assert_eq!(cell.begin_loading(), Ok(LoadState::Loaded));
        assert!(cell.finish_loading(LoadState::Failed));
        assert_eq!(cell.get(), LoadState::Failed);
        assert_eq!(cell.begin_loading(), Ok(LoadState::Failed));
    }

    #[test]
    fn finish_requires_loading() {
        let cell = LoadStateCell::default();
        assert!(!cell.finish_loading(LoadState::Loaded));
        assert_eq!(cell.get(), LoadState::Unloaded);

        cell.begin_loading().unwrap();
        assert!(cell.finish_loading(LoadState::Loaded));
        assert_eq!(cell.get(), LoadState::Loaded);
        assert!(!cell.finish_loading(LoadState::Loaded));
    }

    #[test]
    fn only_one_concurrent_begin_wins() {
        let cell = std::sync::Arc::new(LoadStateCell::default());
        let winners: usize = (0..8)
            .map(|_| {
                let cell = cell.clone();
                std::thread::spawn(move || cell.begin_loading().is_ok())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|t| t.join().unwrap() as usize)
            .sum();
        assert_eq!(winners, 1);
    }
}
