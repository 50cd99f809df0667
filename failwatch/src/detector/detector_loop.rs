use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::Instrument;

use crate::detector::Detector;
use crate::detector::Progress;

/// Drives a [`Detector`] at a fixed interval until it is done or shut down.
pub(crate) struct DetectorLoop<D>
where D: Detector
{
    detector: D,
    interval: Duration,
    rx_shutdown: watch::Receiver<bool>,
}

impl<D> DetectorLoop<D>
where D: Detector
{
    pub(crate) fn spawn(
        detector: D,
        interval: Duration,
        rx_shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let span = tracing::debug_span!("detector", name = %detector.name());

        let this = Self {
            detector,
            interval,
            rx_shutdown,
        };

        tokio::spawn(this.run().instrument(span))
    }

    /// Both the tick and the sleep between ticks race against the shutdown
    /// signal, so a slow query never delays `stop()`.
    async fn run(self) {
        let Self {
            mut detector,
            interval,
            mut rx_shutdown,
        } = self;

        let mut ticks: u64 = 0;

        loop {
            if *rx_shutdown.borrow() {
                break;
            }

            ticks += 1;

            let progress = futures::select_biased! {
                _ = rx_shutdown.changed().fuse() => {
                    debug!("shutdown during tick {}", ticks);
                    break;
                }
                progress = detector.tick().fuse() => progress,
            };

            if progress == Progress::Done {
                debug!("done at tick {}", ticks);
                break;
            }

            futures::select_biased! {
                _ = rx_shutdown.changed().fuse() => {
                    debug!("shutdown after tick {}", ticks);
                    break;
                }
                _ = tokio::time::sleep(interval).fuse() => {}
            }
        }

        debug!("{} exit", func_name!());
    }
}
