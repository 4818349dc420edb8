use std::{
    collections::BTreeMap,
    mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use enclose::enclose;
use serde::{Deserialize, Serialize};

use crate::{
    poller::{Context, Notification},
    store::Store,
};

/// How long a capture session waits for a press before giving up.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

const CAPTURE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Sparse physical-to-logical button mapping. Absent entries mean
/// identity. Entries are never validated against a device's button
/// count at write time, so a mapping survives swapping to a device
/// with fewer buttons; out-of-range entries just never match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonMap(BTreeMap<usize, usize>);

impl ButtonMap {
    #[must_use]
    pub fn resolve(&self, physical: usize) -> usize {
        self.0.get(&physical).copied().unwrap_or(physical)
    }

    pub fn set(&mut self, physical: usize, target: usize) {
        self.0.insert(physical, target);
    }

    pub fn clear(&mut self, physical: usize) {
        self.0.remove(&physical);
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(&physical, &target)| (physical, target))
    }
}

/// An interactive capture: while the session runs, the first pressed
/// button on the active device other than `target` itself becomes what
/// `target` reports as. At most one session is live; starting another
/// one supersedes this one. Dropping the handle cancels the session.
pub struct RemapSession {
    thread: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    target: usize,
}

impl RemapSession {
    pub(crate) fn spawn<S: Store + Send + Sync + 'static>(
        context: Arc<Context<S>>,
        target: usize,
        timeout: Duration,
    ) -> Self {
        // Superseding an older session happens through this bump: the
        // old capture loop notices a newer generation and exits.
        let generation = context.remap_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let stop_flag = Arc::new(AtomicBool::new(false));

        let thread = thread::spawn(enclose!((stop_flag) move || {
            capture_loop(&context, target, timeout, generation, &stop_flag);
        }));

        Self {
            thread: Some(thread),
            stop_flag,
            target,
        }
    }

    #[must_use]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Whether the session is still waiting for a press.
    #[must_use]
    pub fn listening(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }
}

impl Drop for RemapSession {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);

        if let Some(thread) = self.thread.take() {
            mem::drop(thread.join());
        }
    }
}

fn capture_loop<S: Store>(
    context: &Context<S>,
    target: usize,
    timeout: Duration,
    generation: u64,
    stop_flag: &AtomicBool,
) {
    let deadline = Instant::now() + timeout;

    loop {
        if stop_flag.load(Ordering::Acquire)
            || context.remap_generation.load(Ordering::Acquire) != generation
        {
            return;
        }

        if Instant::now() >= deadline {
            context.notify(Notification::RemapTimedOut { target });
            return;
        }

        // First pressed button in index order wins; pressing the target
        // itself keeps the session listening.
        let source = {
            let registry = context.registry.lock().unwrap();
            registry.active_frame().and_then(|frame| {
                frame
                    .buttons
                    .iter()
                    .enumerate()
                    .find_map(|(index, state)| (state.pressed && index != target).then_some(index))
            })
        };

        if let Some(source) = source {
            {
                let mut config = context.config.lock().unwrap();
                if context.remap_generation.load(Ordering::Acquire) != generation {
                    return;
                }
                config.button_mapping.set(target, source);
            }

            context.save_config();
            context.notify(Notification::RemapCaptured { target, source });
            return;
        }

        thread::sleep(CAPTURE_POLL_INTERVAL);
    }
}
