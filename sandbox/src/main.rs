// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Sandbox: a producer thread requests downloads, a handler turns each
//! request into a prioritized task, and agents finish the work on a tokio
//! runtime while the main thread ticks the framework.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, Result};
use keel_core::{FrameClock, FrameworkConfig, Reference, ReferencePool};
use keel_event::{handler, EventArgs, EventPool, EventSender};
use keel_runtime::FrameworkContext;
use keel_task::{StartTaskStatus, Task, TaskAgent, TaskBase};

const DOWNLOAD_REQUESTED: i32 = 1;
const REQUEST_COUNT: usize = 12;

#[derive(Debug, Default)]
struct DownloadRequested {
    url: String,
    size_kb: u64,
    priority: i32,
}

impl Reference for DownloadRequested {
    fn clear(&mut self) {
        self.url.clear();
        self.size_kb = 0;
        self.priority = 0;
    }
}

impl EventArgs for DownloadRequested {
    fn id(&self) -> i32 {
        DOWNLOAD_REQUESTED
    }
}

#[derive(Debug, Default)]
struct DownloadTask {
    base: TaskBase,
    size_kb: u64,
}

impl Reference for DownloadTask {
    fn clear(&mut self) {
        self.base.clear();
        self.size_kb = 0;
    }
}

impl Task for DownloadTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TaskBase {
        &mut self.base
    }
}

/// Simulates a download on the tokio runtime, one millisecond per kilobyte.
struct DownloadAgent {
    runtime: tokio::runtime::Handle,
    download: Option<tokio::task::JoinHandle<()>>,
}

impl TaskAgent<DownloadTask> for DownloadAgent {
    fn start(&mut self, task: &mut DownloadTask) -> StartTaskStatus {
        if task.size_kb == 0 {
            return StartTaskStatus::Done;
        }

        let completion = task.base().completion();
        let delay = Duration::from_millis(task.size_kb);
        log::info!("Downloading {} ({} KB)", task.base().description(), task.size_kb);
        self.download = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            completion.complete();
        }));
        StartTaskStatus::CanResume
    }

    fn reset(&mut self) {
        if let Some(download) = self.download.take() {
            download.abort();
        }
    }
}

fn load_config() -> Result<FrameworkConfig> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("keel.json");
    if !path.exists() {
        log::info!("No '{}' found, using default configuration.", path.display());
        return Ok(FrameworkConfig::default());
    }
    FrameworkConfig::from_path(&path).context("failed to load sandbox configuration")
}

fn spawn_producer(
    references: Arc<ReferencePool>,
    events: Arc<EventPool<DownloadRequested>>,
) -> thread::JoinHandle<Result<()>> {
    thread::spawn(move || {
        for i in 0..REQUEST_COUNT {
            let mut request = references.acquire::<DownloadRequested>()?;
            request.url = format!("https://cdn.example.net/asset-{i}.pak");
            request.size_kb = (i as u64 % 4) * 40;
            request.priority = (i % 3) as i32;
            events.fire(EventSender::new(Arc::new(format!("producer-{i}"))), request)?;
            thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    })
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .context("failed to build the tokio runtime")?;

    let mut context = FrameworkContext::new(config.clone());
    let references = context.references().clone();
    let events = context.add_event_pool::<DownloadRequested>();
    let tasks = context.add_task_pool::<DownloadTask>();

    for _ in 0..config.agent_count {
        tasks.lock().add_agent(Box::new(DownloadAgent {
            runtime: runtime.handle().clone(),
            download: None,
        }));
    }

    {
        let tasks = tasks.clone();
        let references = references.clone();
        let next_serial = AtomicU64::new(1);
        events.subscribe(
            DOWNLOAD_REQUESTED,
            handler(move |sender, request: &DownloadRequested| {
                let mut task = match references.acquire::<DownloadTask>() {
                    Ok(task) => task,
                    Err(e) => {
                        log::error!("Cannot schedule {}: {e}", request.url);
                        return;
                    }
                };
                let serial_id = next_serial.fetch_add(1, Ordering::Relaxed);
                task.base_mut()
                    .initialize(serial_id, Some("download"), request.priority, None);
                task.base_mut().set_description(request.url.clone());
                task.size_kb = request.size_kb;

                log::debug!(
                    "Request from {:?} scheduled as task {serial_id}",
                    sender.downcast_ref::<String>()
                );
                if let Err(e) = tasks.lock().add_task(task) {
                    log::error!("Cannot schedule {}: {e}", request.url);
                }
            }),
        )?;
    }

    let producer = spawn_producer(references.clone(), events.clone());

    let mut clock = FrameClock::new();
    let mut frames = 0u64;
    loop {
        let producing = !producer.is_finished();
        let time = clock.tick();
        if let Err(e) = context.update(time) {
            log::error!("Frame {frames} failed: {e}");
        }
        frames += 1;

        let idle = {
            let tasks = tasks.lock();
            tasks.waiting_task_count() == 0 && tasks.working_agent_count() == 0
        };
        if !producing && idle && events.event_count() == 0 {
            break;
        }

        if frames % 10 == 0 {
            let infos = tasks.lock().all_task_infos();
            log::info!("Frame {frames}: {}", serde_json::to_string(&infos)?);
        }
        thread::sleep(config.tick_interval());
    }

    producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))??;

    log::info!("All downloads finished after {frames} frame(s).");
    log::info!(
        "Reference pools: {}",
        serde_json::to_string_pretty(&references.infos())?
    );

    context.shutdown()?;
    runtime.shutdown_background();
    Ok(())
}
