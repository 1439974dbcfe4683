#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use streamline_loader::{
    LoadError, LoadResult, LoadStateCell, LoaderPool, Resource, ResourceId, ResourceLoader,
    ResourceManager, ResourceStreamer,
};

pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

pub struct TestResource {
    id: ResourceId,
    name: String,
    state: LoadStateCell,
}

impl TestResource {
    pub fn new(name: &str) -> Arc<TestResource> {
        Arc::new(TestResource {
            id: ResourceId::random(),
            name: name.to_string(),
            state: LoadStateCell::default(),
        })
    }
}

impl Resource for TestResource {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn load_state_cell(&self) -> &LoadStateCell {
        &self.state
    }

    fn debug_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

pub type EventLog = Arc<Mutex<Vec<String>>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Deserialize,
    Process,
    Dispatch,
}

/// Behavior of a loader, set on every acquire
#[derive(Clone, Default)]
pub struct LoaderScript {
    pub tag: String,
    pub log: Option<EventLog>,
    pub fail_at: Option<Stage>,
    pub panic_at: Option<Stage>,
    pub deserialize_delay: Option<Duration>,
    pub dispatch_counter: Option<Arc<AtomicUsize>>,
}

pub struct ScriptedLoader {
    script: LoaderScript,
    manager: Weak<dyn ResourceManager>,
    // Thread name each stage ran on
    pub threads: Arc<Mutex<Vec<(Stage, Option<String>)>>>,
}

impl ScriptedLoader {
    fn run(
        &mut self,
        stage: Stage,
        marker: &str,
    ) -> LoadResult<()> {
        self.threads
            .lock()
            .unwrap()
            .push((stage, std::thread::current().name().map(|x| x.to_string())));

        if self.script.panic_at == Some(stage) {
            panic!("scripted panic in {:?}", stage);
        }

        if let Some(log) = &self.script.log {
            log.lock()
                .unwrap()
                .push(format!("{}{}", marker, self.script.tag));
        }

        if self.script.fail_at == Some(stage) {
            return Err(LoadError::from(format!("scripted failure in {:?}", stage)));
        }

        Ok(())
    }
}

impl ResourceLoader for ScriptedLoader {
    fn on_deserialization(&mut self) -> LoadResult<()> {
        if let Some(delay) = self.script.deserialize_delay {
            std::thread::sleep(delay);
        }
        self.run(Stage::Deserialize, "D")
    }

    fn on_processing(&mut self) -> LoadResult<()> {
        self.run(Stage::Process, "P")
    }

    fn on_renderer_backend_dispatch(&mut self) -> LoadResult<()> {
        self.run(Stage::Dispatch, "X")?;
        if let Some(counter) = &self.script.dispatch_counter {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn resource_manager(&self) -> Option<Arc<dyn ResourceManager>> {
        self.manager.upgrade()
    }
}

pub struct TestManager {
    weak_self: Weak<TestManager>,
    pub pool: LoaderPool<ScriptedLoader>,
    pub released: AtomicUsize,
}

impl TestManager {
    pub fn new() -> Arc<TestManager> {
        Arc::new_cyclic(|weak_self| TestManager {
            weak_self: weak_self.clone(),
            pool: LoaderPool::new(),
            released: AtomicUsize::new(0),
        })
    }

    pub fn loader(
        &self,
        script: LoaderScript,
    ) -> Box<ScriptedLoader> {
        let manager: Weak<dyn ResourceManager> = self.weak_self.clone();
        let mut loader = self.pool.acquire_with(|| ScriptedLoader {
            script: LoaderScript::default(),
            manager,
            threads: Default::default(),
        });
        loader.script = script;
        loader.threads = Default::default();
        loader
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ResourceManager for TestManager {
    fn release_resource_loader_instance(
        &self,
        loader: Box<dyn ResourceLoader>,
    ) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.pool.release(loader);
    }
}

pub fn script(
    tag: &str,
    log: &EventLog,
) -> LoaderScript {
    LoaderScript {
        tag: tag.to_string(),
        log: Some(log.clone()),
        ..Default::default()
    }
}

/// Calls dispatch() like a frame loop would until `done` returns true or the timeout expires
pub fn pump_until<F: FnMut() -> bool>(
    streamer: &ResourceStreamer,
    timeout: Duration,
    mut done: F,
) -> bool {
    let start = Instant::now();
    loop {
        streamer.dispatch();
        if done() {
            return true;
        }

        if start.elapsed() > timeout {
            return false;
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Threads of this process whose name starts with `prefix`, and their summed user + system CPU
/// time in clock ticks. Linux truncates thread names to 15 bytes, so keep prefixes short.
#[cfg(target_os = "linux")]
pub fn thread_cpu_ticks(prefix: &str) -> (usize, u64) {
    let mut thread_count = 0;
    let mut ticks = 0;
    let tasks = match std::fs::read_dir("/proc/self/task") {
        Ok(tasks) => tasks,
        Err(_) => return (0, 0),
    };

    for task in tasks.flatten() {
        let comm = std::fs::read_to_string(task.path().join("comm")).unwrap_or_default();
        if !comm.trim_end().starts_with(prefix) {
            continue;
        }

        let stat = match std::fs::read_to_string(task.path().join("stat")) {
            Ok(stat) => stat,
            Err(_) => continue,
        };

        // Fields after "(comm)" start at the state, field 3. utime and stime are fields 14 and 15.
        let after_comm = match stat.rfind(')') {
            Some(index) => &stat[index + 1..],
            None => continue,
        };
        let fields: Vec<&str> = after_comm.split_whitespace().collect();
        let utime: u64 = fields[11].parse().unwrap();
        let stime: u64 = fields[12].parse().unwrap();

        thread_count += 1;
        ticks += utime + stime;
    }

    (thread_count, ticks)
}
