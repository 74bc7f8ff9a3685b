//! Animation containers.

use field_common::{FieldError, FieldResult};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use renderer::RenderedFrame;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Receives rendered frames in display order and produces the final bytes.
pub trait FrameSink {
    fn mime_type(&self) -> &'static str;

    /// Append one frame.
    fn push(&mut self, frame: &RenderedFrame) -> FieldResult<()>;

    /// Frames accepted so far.
    fn frame_count(&self) -> usize;

    /// Close the container and return its bytes.
    fn finish(self) -> FieldResult<Vec<u8>>
    where
        Self: Sized;
}

/// In-memory writer that stays reachable after the encoder takes it.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "output buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Looping animated GIF.
pub struct GifSink {
    encoder: GifEncoder<SharedBuffer>,
    output: SharedBuffer,
    size: (u32, u32),
    delay: Delay,
    frames: usize,
}

/// NeuQuant speed; 1 is best quality, 30 fastest.
const GIF_SPEED: i32 = 10;

impl GifSink {
    pub fn new(width: u32, height: u32, fps: u32) -> FieldResult<Self> {
        if fps == 0 {
            return Err(FieldError::invalid("fps", "must be positive"));
        }
        let output = SharedBuffer::default();
        let mut encoder = GifEncoder::new_with_speed(output.clone(), GIF_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| FieldError::encoding(format!("GIF header: {}", e)))?;

        Ok(Self {
            encoder,
            output,
            size: (width, height),
            delay: Delay::from_numer_denom_ms(1000, fps),
            frames: 0,
        })
    }
}

impl FrameSink for GifSink {
    fn mime_type(&self) -> &'static str {
        "image/gif"
    }

    fn push(&mut self, frame: &RenderedFrame) -> FieldResult<()> {
        if (frame.width(), frame.height()) != self.size {
            return Err(FieldError::encoding(format!(
                "frame {} is {}x{}, animation is {}x{}",
                frame.time,
                frame.width(),
                frame.height(),
                self.size.0,
                self.size.1
            )));
        }
        let buffer = RgbaImage::from_raw(
            frame.width(),
            frame.height(),
            frame.raster.data().to_vec(),
        )
        .ok_or_else(|| FieldError::encoding("frame buffer size mismatch"))?;

        self.encoder
            .encode_frame(Frame::from_parts(buffer, 0, 0, self.delay))
            .map_err(|e| FieldError::encoding(format!("GIF frame {}: {}", self.frames, e)))?;
        self.frames += 1;
        Ok(())
    }

    fn frame_count(&self) -> usize {
        self.frames
    }

    fn finish(self) -> FieldResult<Vec<u8>> {
        let Self {
            encoder, output, ..
        } = self;
        // Dropping the encoder writes the GIF trailer
        drop(encoder);
        let mut bytes = output
            .0
            .lock()
            .map_err(|_| FieldError::encoding("output buffer poisoned"))?;
        Ok(std::mem::take(&mut *bytes))
    }
}
