use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use super::{LoadSampler, SampleUnavailable, TickSource};

/// Background thread that performs OS counter reads on request, so a slow
/// read never stalls frame playback.
pub struct SamplerWorker {
    requests: Option<SyncSender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SamplerWorker {
    /// Start the worker. `deliver` receives every result and returns `false`
    /// once nobody is listening anymore, which ends the thread.
    pub fn spawn<S, F>(sampler: LoadSampler<S>, mut deliver: F) -> std::io::Result<Self>
    where
        S: TickSource + Send + 'static,
        F: FnMut(Result<f32, SampleUnavailable>) -> bool + Send + 'static,
    {
        // Capacity 1: at most one request waits while a read is in flight.
        let (tx, rx) = mpsc::sync_channel::<()>(1);

        let handle = thread::Builder::new()
            .name("load-sampler".into())
            .spawn(move || {
                while rx.recv().is_ok() {
                    if !deliver(sampler.sample()) {
                        break;
                    }
                }
                log::debug!("Load sampler thread exiting");
            })?;

        Ok(Self {
            requests: Some(tx),
            handle: Some(handle),
        })
    }

    /// Ask for one sample. Returns `false` if the request was dropped.
    pub fn request(&self) -> bool {
        let Some(tx) = &self.requests else {
            return false;
        };
        match tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                log::debug!("Load sampler busy, skipping this cycle");
                false
            }
            Err(TrySendError::Disconnected(())) => false,
        }
    }

    /// Close the request channel and wait for the thread to finish.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Load sampler thread panicked");
            }
        }
    }
}

impl Drop for SamplerWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::CpuTicks;
    use std::time::Duration;

    struct Fixed;

    impl TickSource for Fixed {
        fn read_ticks(&self) -> Result<CpuTicks, SampleUnavailable> {
            Ok(CpuTicks {
                user: 50,
                system: 20,
                idle: 20,
                nice: 10,
            })
        }
    }

    struct Zero;

    impl TickSource for Zero {
        fn read_ticks(&self) -> Result<CpuTicks, SampleUnavailable> {
            Ok(CpuTicks::default())
        }
    }

    #[test]
    fn delivers_requested_sample() {
        let (tx, rx) = mpsc::channel();
        let mut worker =
            SamplerWorker::spawn(LoadSampler::new(Fixed), move |r| tx.send(r).is_ok()).unwrap();

        assert!(worker.request());
        let got = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert!((got - 80.0).abs() < 1e-4);

        worker.shutdown();
        assert!(!worker.request());
    }

    #[test]
    fn delivers_unavailable_without_stopping() {
        let (tx, rx) = mpsc::channel();
        let worker =
            SamplerWorker::spawn(LoadSampler::new(Zero), move |r| tx.send(r).is_ok()).unwrap();

        for _ in 0..3 {
            // Wait for each result so the bounded channel never fills.
            assert!(worker.request());
            let got = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert!(matches!(got, Err(SampleUnavailable::ZeroTotal)));
        }
    }

    #[test]
    fn drop_joins_idle_thread() {
        let worker = SamplerWorker::spawn(LoadSampler::new(Fixed), |_| true).unwrap();
        drop(worker);
    }
}
