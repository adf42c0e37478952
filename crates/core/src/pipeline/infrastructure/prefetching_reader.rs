use std::path::Path;
use std::thread::JoinHandle;

use crate::shared::constants::PREFETCH_CAPACITY;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Decodes on a dedicated thread so the next frame is ready while the
/// current one is being detected and classified.
///
/// Frames travel over a bounded channel, so stream order is unchanged and
/// decoding never runs more than `capacity` frames ahead.
pub struct PrefetchingReader {
    inner: Option<Box<dyn VideoReader>>,
    handle: Option<JoinHandle<Box<dyn VideoReader>>>,
    capacity: usize,
}

impl PrefetchingReader {
    pub fn new(inner: Box<dyn VideoReader>) -> Self {
        Self::with_capacity(inner, PREFETCH_CAPACITY)
    }

    pub fn with_capacity(inner: Box<dyn VideoReader>, capacity: usize) -> Self {
        Self {
            inner: Some(inner),
            handle: None,
            capacity: capacity.max(1),
        }
    }

    /// Waits for the decode thread and takes the inner reader back.
    fn reclaim(&mut self) {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(reader) => self.inner = Some(reader),
                Err(_) => log::error!("Frame decode thread panicked"),
            }
        }
    }
}

impl VideoReader for PrefetchingReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        self.reclaim();
        self.inner
            .as_mut()
            .ok_or("PrefetchingReader: inner reader lost")?
            .open(path)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        self.reclaim();
        let Some(mut reader) = self.inner.take() else {
            return Box::new(std::iter::once(Err(
                "PrefetchingReader: inner reader lost".into()
            )));
        };

        let (tx, rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(self.capacity);
        self.handle = Some(std::thread::spawn(move || {
            for item in reader.frames() {
                let item = item.map_err(|e| -> SendError { e.to_string().into() });
                let failed = item.is_err();
                // Receiver gone: the consumer stopped early.
                if tx.send(item).is_err() || failed {
                    break;
                }
            }
            reader
        }));

        Box::new(
            rx.into_iter()
                .map(|item| item.map_err(|e| -> Box<dyn std::error::Error> { e })),
        )
    }

    fn close(&mut self) {
        self.reclaim();
        if let Some(reader) = self.inner.as_mut() {
            reader.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct StubReader {
        count: usize,
        fail_at: Option<usize>,
        closed: Arc<AtomicBool>,
    }

    impl StubReader {
        fn new(count: usize) -> Self {
            Self {
                count,
                fail_at: None,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(VideoMetadata {
                width: 2,
                height: 2,
                fps: 30.0,
                total_frames: self.count,
                source_path: None,
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let fail_at = self.fail_at;
            Box::new((0..self.count).map(move |i| -> Result<Frame, Box<dyn std::error::Error>> {
                if Some(i) == fail_at {
                    Err("capture failed".into())
                } else {
                    Ok(Frame::new(vec![0u8; 12], 2, 2, 3, i))
                }
            }))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let mut reader = PrefetchingReader::with_capacity(Box::new(StubReader::new(20)), 2);
        reader.open(Path::new("clip.mp4")).unwrap();

        let indices: Vec<usize> = reader.frames().map(|f| f.unwrap().index()).collect();

        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_error_ends_stream() {
        let mut stub = StubReader::new(10);
        stub.fail_at = Some(3);
        let mut reader = PrefetchingReader::new(Box::new(stub));

        let items: Vec<_> = reader.frames().collect();

        assert_eq!(items.len(), 4);
        assert!(items[3].is_err());
        assert_eq!(items[3].as_ref().unwrap_err().to_string(), "capture failed");
    }

    #[test]
    fn test_early_stop_then_close_reclaims_inner() {
        let stub = StubReader::new(100);
        let closed = stub.closed.clone();
        let mut reader = PrefetchingReader::with_capacity(Box::new(stub), 1);

        {
            let mut frames = reader.frames();
            assert!(frames.next().is_some());
        }
        reader.close();

        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_can_reopen_after_full_pass() {
        let mut reader = PrefetchingReader::new(Box::new(StubReader::new(3)));
        assert_eq!(reader.frames().count(), 3);
        let meta = reader.open(Path::new("again.mp4")).unwrap();
        assert_eq!(meta.total_frames, 3);
    }
}
