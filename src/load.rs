use std::{
    fs::File,
    io::{BufRead, BufReader, Seek},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{ensure, Context, Result};
use crossbeam_channel::Sender;
use eframe::egui;
use image::{codecs::gif::GifDecoder, AnimationDecoder};

/// One decoded RGBA frame with its display delay.
#[derive(Debug)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
    pub delay: Duration,
}

/// A completed load, tagged with the generation it was requested under.
/// The UI drops messages whose generation is no longer current, so the most
/// recently requested file always wins a race between in-flight decodes.
pub struct LoadMsg {
    pub generation: u64,
    pub path: PathBuf,
    pub frames: Vec<Frame>,
}

pub const LOAD_CHAN_CAP: usize = 4;

/// Clamp for zero/absurdly short GIF frame delays (roughly 60 FPS).
const MIN_FRAME_DELAY: Duration = Duration::from_millis(16);

/// Decode every frame of a GIF along with its per-frame delay.
pub fn decode_gif_frames(path: &Path) -> Result<Vec<Frame>> {
    let file =
        File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    decode_frames(BufReader::new(file))
        .with_context(|| format!("could not decode {}", path.display()))
}

fn decode_frames(reader: impl BufRead + Seek) -> Result<Vec<Frame>> {
    let decoder = GifDecoder::new(reader)?;
    let mut frames = Vec::new();

    for frame in decoder.into_frames() {
        let frame = frame?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let delay_ms = if denom == 0 {
            0.0
        } else {
            f64::from(numer) / f64::from(denom)
        };
        let delay = Duration::from_secs_f64(delay_ms / 1000.0).max(MIN_FRAME_DELAY);

        let buffer = frame.into_buffer();
        frames.push(Frame {
            width: buffer.width() as usize,
            height: buffer.height() as usize,
            rgba: buffer.into_raw(),
            delay,
        });
    }

    ensure!(!frames.is_empty(), "no frames in animation");
    Ok(frames)
}

/// Decode `path` on a background thread so the window stays responsive, then
/// hand the frames to the UI loop over `tx`.
///
/// A mid-decode generation bump means a newer load superseded this one; the
/// result is dropped here (and checked again on the UI side). Decode failure
/// is logged and leaves whatever is currently displayed untouched.
pub fn spawn_load(
    path: PathBuf,
    generation: u64,
    current_gen: Arc<AtomicU64>,
    tx: Sender<LoadMsg>,
    ctx: egui::Context,
) {
    std::thread::spawn(move || {
        match decode_gif_frames(&path) {
            Ok(frames) => {
                if generation != current_gen.load(Ordering::Relaxed) {
                    return;
                }
                let _ = tx.send(LoadMsg {
                    generation,
                    path,
                    frames,
                });
                ctx.request_repaint();
            }
            Err(err) => log::error!("{err:#}"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{codecs::gif::GifEncoder, Delay, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encoded_gif(delays_ms: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut out);
            let frames = delays_ms.iter().enumerate().map(|(i, &ms)| {
                let mut img = RgbaImage::new(4, 2);
                img.put_pixel(0, 0, Rgba([i as u8 * 40, 0, 0, 255]));
                image::Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(ms, 1))
            });
            encoder.encode_frames(frames).unwrap();
        }
        out
    }

    #[test]
    fn decodes_all_frames_with_delays() {
        let bytes = encoded_gif(&[120, 200, 80]);
        let frames = decode_frames(Cursor::new(bytes)).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].delay, Duration::from_millis(120));
        assert_eq!(frames[1].delay, Duration::from_millis(200));
        assert_eq!(frames[2].delay, Duration::from_millis(80));
        for f in &frames {
            assert_eq!((f.width, f.height), (4, 2));
            assert_eq!(f.rgba.len(), 4 * 2 * 4);
        }
    }

    #[test]
    fn zero_delay_is_clamped() {
        let bytes = encoded_gif(&[0, 0]);
        let frames = decode_frames(Cursor::new(bytes)).unwrap();
        for f in frames {
            assert!(f.delay >= MIN_FRAME_DELAY);
        }
    }

    #[test]
    fn garbage_input_is_an_error() {
        assert!(decode_frames(Cursor::new(b"not a gif".to_vec())).is_err());
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = decode_gif_frames(Path::new("does-not-exist.gif")).unwrap_err();
        assert!(format!("{err:#}").contains("does-not-exist.gif"));
    }

    #[test]
    fn stale_generation_result_is_dropped() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.gif");
        std::fs::write(&path, encoded_gif(&[50])).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(LOAD_CHAN_CAP);
        let ctx = egui::Context::default();

        // generation 1 was superseded by 2 before this decode finished
        let current = Arc::new(AtomicU64::new(2));
        spawn_load(path.clone(), 1, current.clone(), tx.clone(), ctx.clone());
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

        // a load whose generation is still current comes through
        spawn_load(path, 2, current, tx, ctx);
        let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(msg.generation, 2);
        assert_eq!(msg.frames.len(), 1);
    }
}
