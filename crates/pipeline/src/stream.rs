//! Bounded render → encode pipeline.
//!
//! A producer thread evaluates temporal frames and renders them; the calling
//! thread feeds them to the sink. The channel bound caps how many rendered
//! frames exist at once, and the single FIFO channel keeps display order.

use field_common::{FieldError, FieldResult, NormalizationRange};
use interpolation::TemporalInterpolator;
use renderer::{FrameRenderer, RenderedFrame};
use std::sync::mpsc::sync_channel;
use std::thread;
use tracing::{debug, warn};

use crate::sink::FrameSink;

/// Render every frame of `frames` into `sink`, returning the count written.
///
/// The first error from either side stops both: a render failure is
/// forwarded through the channel, and an encode failure hangs up the
/// receiver so the producer's next send fails.
pub fn stream_frames<S: FrameSink>(
    frames: &TemporalInterpolator,
    renderer: &FrameRenderer,
    range: &NormalizationRange,
    sink: &mut S,
    depth: usize,
) -> FieldResult<usize> {
    let (tx, rx) = sync_channel::<FieldResult<RenderedFrame>>(depth.max(1));

    thread::scope(|scope| {
        let producer = scope.spawn(move || {
            for (index, field) in frames.frames().enumerate() {
                let rendered = field.and_then(|f| renderer.render(&f, range));
                let failed = rendered.is_err();
                if tx.send(rendered).is_err() {
                    debug!(index, "Encoder hung up, stopping render");
                    break;
                }
                if failed {
                    break;
                }
            }
        });

        let mut written = 0usize;
        let mut outcome = Ok(());
        for rendered in rx {
            match rendered.and_then(|frame| sink.push(&frame)) {
                Ok(()) => {
                    written += 1;
                    debug!(frame = written, "Encoded frame");
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if producer.join().is_err() {
            warn!("Frame producer panicked");
            return Err(FieldError::Internal("frame producer panicked".to_string()));
        }
        outcome.map(|_| written)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundary::Boundary;
    use field_common::{SampleTime, SpatialField};
    use renderer::{ClipGeometry, FrameStyle, Palette};
    use test_utils::LAGOON_GEOJSON;

    /// Keeps the time of every frame it receives.
    #[derive(Default)]
    struct RecordingSink {
        times: Vec<SampleTime>,
    }

    impl FrameSink for RecordingSink {
        fn mime_type(&self) -> &'static str {
            "application/octet-stream"
        }

        fn push(&mut self, frame: &RenderedFrame) -> FieldResult<()> {
            self.times.push(frame.time.clone());
            Ok(())
        }

        fn frame_count(&self) -> usize {
            self.times.len()
        }

        fn finish(self) -> FieldResult<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    /// Accepts `limit` frames, then fails every push.
    struct FailingSink {
        limit: usize,
        accepted: usize,
    }

    impl FrameSink for FailingSink {
        fn mime_type(&self) -> &'static str {
            "application/octet-stream"
        }

        fn push(&mut self, _frame: &RenderedFrame) -> FieldResult<()> {
            if self.accepted == self.limit {
                return Err(FieldError::encoding("container full"));
            }
            self.accepted += 1;
            Ok(())
        }

        fn frame_count(&self) -> usize {
            self.accepted
        }

        fn finish(self) -> FieldResult<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn renderer() -> FrameRenderer {
        let boundary = Boundary::from_geojson_str(LAGOON_GEOJSON).unwrap();
        let clip = ClipGeometry::simple(boundary.bounds(), boundary.shape().clone());
        let style = FrameStyle::new(Palette::by_name("viridis").unwrap(), 16);
        FrameRenderer::new(&clip, style).unwrap()
    }

    fn interpolator(frames_per_transition: usize) -> TemporalInterpolator {
        let controls = ["2024-01-01", "2024-01-02", "2024-01-03"]
            .iter()
            .enumerate()
            .map(|(i, label)| {
                SpatialField::new(SampleTime::parse(*label), 4, vec![i as f32; 16]).unwrap()
            })
            .collect();
        TemporalInterpolator::new(controls, frames_per_transition).unwrap()
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let frames = interpolator(6);
        let range = NormalizationRange::new(0.0, 2.0).unwrap();
        let mut sink = RecordingSink::default();

        let written = stream_frames(&frames, &renderer(), &range, &mut sink, 2).unwrap();

        assert_eq!(written, frames.frame_count());
        assert_eq!(sink.frame_count(), frames.frame_count());
        assert!(sink.times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sink_error_stops_producer() {
        let frames = interpolator(20);
        let range = NormalizationRange::new(0.0, 2.0).unwrap();
        let mut sink = FailingSink {
            limit: 3,
            accepted: 0,
        };

        let err = stream_frames(&frames, &renderer(), &range, &mut sink, 1).unwrap_err();

        assert!(matches!(err, FieldError::Encoding(_)));
        assert_eq!(sink.frame_count(), 3);
    }
}
