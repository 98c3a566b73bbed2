//! Lock-free SPSC ring over a shared memory segment.
//!
//! Segment layout, offsets in bytes:
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0      | write cursor (`u32`, atomic) |
//! | 64     | read cursor (`u32`, atomic) |
//! | 128    | magic |
//! | 132    | capacity in frames |
//! | 136    | channel count |
//! | 192    | interleaved `f32` samples, `capacity * channels` |
//!
//! Cursors count frames in `[0, capacity)`. Only [`SharedRingWriter`] stores the write cursor and
//! only [`SharedRingReader`] stores the read cursor; a segment splits into exactly one of each.

use crate::{
    Error, Result, TransportChunk, TransportMetrics, TransportMode, TransportReader,
    TransportWriter,
};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const WRITE_CURSOR_OFFSET: usize = 0;
const READ_CURSOR_OFFSET: usize = 64;
const MAGIC_OFFSET: usize = 128;
const CAPACITY_OFFSET: usize = 132;
const CHANNELS_OFFSET: usize = 136;
const HEADER_SIZE: usize = 192;

const SEGMENT_MAGIC: u32 = 0x5650_5247;

/// Frames ready for the reader.
#[inline]
pub fn available_read(write: usize, read: usize, capacity: usize) -> usize {
    (write + capacity - read) % capacity
}

/// Frames the writer may commit. One slot stays empty so full and empty differ.
#[inline]
pub fn available_write(write: usize, read: usize, capacity: usize) -> usize {
    capacity - available_read(write, read, capacity) - 1
}

fn validate_layout(capacity: usize, channels: usize) -> Result<()> {
    if capacity < 2 || capacity > u32::MAX as usize || channels == 0 || channels > u32::MAX as usize
    {
        return Err(Error::InvalidLayout { capacity, channels });
    }
    Ok(())
}

fn segment_size(capacity: usize, channels: usize) -> Result<usize> {
    capacity
        .checked_mul(channels)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
        .and_then(|n| n.checked_add(HEADER_SIZE))
        .ok_or(Error::InvalidLayout { capacity, channels })
}

fn shm_path(name: &str) -> PathBuf {
    #[cfg(target_os = "linux")]
    let base = PathBuf::from("/dev/shm");

    #[cfg(not(target_os = "linux"))]
    let base = std::env::temp_dir();

    base.join(format!("varipitch_{}", name))
}

struct SegmentInner {
    _mmap: MmapMut,
    base: NonNull<u8>,
    capacity: usize,
    channels: usize,
    path: Option<PathBuf>,
    owns_file: bool,
}

// SAFETY: the mapping lives exactly as long as `SegmentInner`. Header fields are only touched
// through atomics. A sample slot is written by the single writer before it publishes the write
// cursor (Release) and read by the single reader after observing that cursor (Acquire), and
// the writer never touches slots between the read and write cursors.
unsafe impl Send for SegmentInner {}
unsafe impl Sync for SegmentInner {}

impl SegmentInner {
    fn new(
        mut mmap: MmapMut,
        capacity: usize,
        channels: usize,
        path: Option<PathBuf>,
        owns_file: bool,
    ) -> Result<Self> {
        let base = NonNull::new(mmap.as_mut_ptr())
            .ok_or_else(|| Error::SharedMemory("Memory map returned a null base".to_string()))?;
        Ok(Self {
            _mmap: mmap,
            base,
            capacity,
            channels,
            path,
            owns_file,
        })
    }

    #[inline]
    fn atomic(&self, offset: usize) -> &AtomicU32 {
        // SAFETY: offset is a 4-byte aligned header field inside the page-aligned mapping.
        unsafe { &*(self.base.as_ptr().add(offset) as *const AtomicU32) }
    }

    #[inline]
    fn write_cursor(&self) -> &AtomicU32 {
        self.atomic(WRITE_CURSOR_OFFSET)
    }

    #[inline]
    fn read_cursor(&self) -> &AtomicU32 {
        self.atomic(READ_CURSOR_OFFSET)
    }

    #[inline]
    fn sample_ptr(&self, slot: usize, channel: usize) -> *mut f32 {
        debug_assert!(slot < self.capacity && channel < self.channels);
        // SAFETY: slot and channel are bounded by the layout validated at construction.
        unsafe {
            (self.base.as_ptr().add(HEADER_SIZE) as *mut f32).add(slot * self.channels + channel)
        }
    }
}

impl Drop for SegmentInner {
    fn drop(&mut self) {
        if self.owns_file {
            if let Some(path) = &self.path {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

/// A mapped memory region holding the ring header and samples.
///
/// The creating handle owns a file-backed segment and removes the file when the last half
/// built from it is dropped.
pub struct SharedSegment {
    inner: Arc<SegmentInner>,
}

impl SharedSegment {
    /// Private in-process segment.
    pub fn anonymous(capacity: usize, channels: usize) -> Result<Self> {
        validate_layout(capacity, channels)?;
        let size = segment_size(capacity, channels)?;
        let mmap = MmapOptions::new().len(size).map_anon()?;
        Self::initialize(mmap, capacity, channels, None)
    }

    /// Named segment under the system shared memory directory.
    pub fn create(name: &str, capacity: usize, channels: usize) -> Result<Self> {
        Self::create_at(shm_path(name), capacity, channels)
    }

    pub fn create_at(path: impl AsRef<Path>, capacity: usize, channels: usize) -> Result<Self> {
        validate_layout(capacity, channels)?;
        let size = segment_size(capacity, channels)?;
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| {
                Error::SharedMemory(format!("Failed to create shared memory file: {}", e))
            })?;
        file.set_len(size as u64)
            .map_err(|e| Error::SharedMemory(format!("Failed to set file size: {}", e)))?;

        // SAFETY: the file was just created and sized here. Other mappings of it follow the
        // single-writer/single-reader protocol of this module.
        let mmap = unsafe { MmapMut::map_mut(&file) }
            .map_err(|e| Error::SharedMemory(format!("Failed to create memory map: {}", e)))?;

        tracing::debug!(path = %path.display(), capacity, channels, "created shared ring segment");
        Self::initialize(mmap, capacity, channels, Some(path))
    }

    /// Map a segment created by another handle or process.
    pub fn open(name: &str) -> Result<Self> {
        Self::open_at(shm_path(name))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                Error::SharedMemory(format!("Failed to open shared memory file: {}", e))
            })?;

        let len = file.metadata()?.len() as usize;
        if len < HEADER_SIZE {
            return Err(Error::SharedMemory(format!(
                "Segment too small for header: {} bytes",
                len
            )));
        }

        // SAFETY: see `create_at`.
        let mmap = unsafe { MmapMut::map_mut(&file) }
            .map_err(|e| Error::SharedMemory(format!("Failed to open memory map: {}", e)))?;

        let header_u32 = |offset: usize| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&mmap[offset..offset + 4]);
            u32::from_ne_bytes(bytes)
        };
        if header_u32(MAGIC_OFFSET) != SEGMENT_MAGIC {
            return Err(Error::SharedMemory(
                "Not a varipitch ring segment".to_string(),
            ));
        }
        let capacity = header_u32(CAPACITY_OFFSET) as usize;
        let channels = header_u32(CHANNELS_OFFSET) as usize;
        validate_layout(capacity, channels)?;
        if len < segment_size(capacity, channels)? {
            return Err(Error::SharedMemory(format!(
                "Segment truncated: {} bytes for {} frames x {} channels",
                len, capacity, channels
            )));
        }

        let inner = SegmentInner::new(mmap, capacity, channels, Some(path), false)?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    fn initialize(
        mmap: MmapMut,
        capacity: usize,
        channels: usize,
        path: Option<PathBuf>,
    ) -> Result<Self> {
        let owns_file = path.is_some();
        let inner = SegmentInner::new(mmap, capacity, channels, path, owns_file)?;
        inner.write_cursor().store(0, Ordering::Relaxed);
        inner.read_cursor().store(0, Ordering::Relaxed);
        inner
            .atomic(CAPACITY_OFFSET)
            .store(capacity as u32, Ordering::Relaxed);
        inner
            .atomic(CHANNELS_OFFSET)
            .store(channels as u32, Ordering::Relaxed);
        inner
            .atomic(MAGIC_OFFSET)
            .store(SEGMENT_MAGIC, Ordering::Release);
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn channels(&self) -> usize {
        self.inner.channels
    }

    /// Backing file, `None` for anonymous segments.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn split(self) -> (SharedRingWriter, SharedRingReader) {
        let writer = SharedRingWriter::new(Arc::clone(&self.inner));
        let reader = SharedRingReader::new(self.inner);
        (writer, reader)
    }

    /// Keep only the producer half, for a segment whose reader lives in another process.
    pub fn into_writer(self) -> SharedRingWriter {
        SharedRingWriter::new(self.inner)
    }

    /// Keep only the consumer half, for a segment whose writer lives in another process.
    pub fn into_reader(self) -> SharedRingReader {
        SharedRingReader::new(self.inner)
    }
}

impl std::fmt::Debug for SharedSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSegment")
            .field("capacity", &self.inner.capacity)
            .field("channels", &self.inner.channels)
            .field("path", &self.inner.path)
            .finish()
    }
}

/// Producer half of the ring. Not `Clone`.
pub struct SharedRingWriter {
    segment: Arc<SegmentInner>,
    metrics: Arc<TransportMetrics>,
}

impl SharedRingWriter {
    fn new(segment: Arc<SegmentInner>) -> Self {
        Self {
            segment,
            metrics: Arc::new(TransportMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<TransportMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn capacity(&self) -> usize {
        self.segment.capacity
    }

    pub fn channels(&self) -> usize {
        self.segment.channels
    }

    pub fn available_write(&self) -> usize {
        let write = self.segment.write_cursor().load(Ordering::Relaxed) as usize;
        let read = self.segment.read_cursor().load(Ordering::Acquire) as usize;
        available_write(write, read, self.segment.capacity)
    }

    /// Interleave one slice per channel into the ring. Fewer slices than channels repeat the
    /// last slice; extra slices are ignored. Frames that do not fit are dropped.
    ///
    /// Returns the number of frames committed.
    pub fn write(&mut self, channels: &[&[f32]]) -> usize {
        let Some(last) = channels.last() else {
            return 0;
        };
        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        if frames == 0 {
            return 0;
        }

        let capacity = self.segment.capacity;
        let channel_count = self.segment.channels;
        let write = self.segment.write_cursor().load(Ordering::Relaxed) as usize;
        let read = self.segment.read_cursor().load(Ordering::Acquire) as usize;
        let count = frames.min(available_write(write, read, capacity));

        for i in 0..count {
            let slot = (write + i) % capacity;
            for ch in 0..channel_count {
                let source = channels.get(ch).unwrap_or(last);
                // SAFETY: the slot lies outside the reader's window until the cursor below is
                // published.
                unsafe { self.segment.sample_ptr(slot, ch).write(source[i]) };
            }
        }

        self.segment
            .write_cursor()
            .store(((write + count) % capacity) as u32, Ordering::Release);

        self.metrics.record_frames_written(count as u64);
        if count < frames {
            self.metrics.record_overflow((frames - count) as u64);
        }
        count
    }

    /// Write a mono block into every channel.
    pub fn write_mono(&mut self, samples: &[f32]) -> usize {
        self.write(&[samples])
    }
}

impl TransportWriter for SharedRingWriter {
    fn write_block(&mut self, samples: &[f32], _frame_position: u64) {
        self.write_mono(samples);
    }

    fn mode(&self) -> TransportMode {
        TransportMode::SharedRing
    }
}

/// Consumer half of the ring. Not `Clone`.
pub struct SharedRingReader {
    segment: Arc<SegmentInner>,
    sample_rate: u32,
    frames_read: u64,
    scratch: Vec<f32>,
}

impl SharedRingReader {
    fn new(segment: Arc<SegmentInner>) -> Self {
        Self {
            segment,
            sample_rate: 48000,
            frames_read: 0,
            scratch: Vec::new(),
        }
    }

    /// Sample rate stamped on polled chunks (default: 48000).
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn capacity(&self) -> usize {
        self.segment.capacity
    }

    pub fn channels(&self) -> usize {
        self.segment.channels
    }

    /// Total frames consumed since creation.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn available_read(&self) -> usize {
        let write = self.segment.write_cursor().load(Ordering::Acquire) as usize;
        let read = self.segment.read_cursor().load(Ordering::Relaxed) as usize;
        available_read(write, read, self.segment.capacity)
    }

    /// Copy up to `max_frames` interleaved frames into `out`. Returns frames copied.
    pub fn read(&mut self, out: &mut [f32], max_frames: usize) -> usize {
        let capacity = self.segment.capacity;
        let channel_count = self.segment.channels;
        let write = self.segment.write_cursor().load(Ordering::Acquire) as usize;
        let read = self.segment.read_cursor().load(Ordering::Relaxed) as usize;
        let count = available_read(write, read, capacity)
            .min(max_frames)
            .min(out.len() / channel_count);

        for i in 0..count {
            let slot = (read + i) % capacity;
            for ch in 0..channel_count {
                // SAFETY: the slot was published by the writer's Release store observed above.
                out[i * channel_count + ch] = unsafe { self.segment.sample_ptr(slot, ch).read() };
            }
        }

        self.segment
            .read_cursor()
            .store(((read + count) % capacity) as u32, Ordering::Release);
        self.frames_read += count as u64;
        count
    }

    /// Skip everything currently readable.
    pub fn clear(&mut self) {
        let write = self.segment.write_cursor().load(Ordering::Acquire);
        let read = self.segment.read_cursor().load(Ordering::Relaxed) as usize;
        let skipped = available_read(write as usize, read, self.segment.capacity);
        self.segment.read_cursor().store(write, Ordering::Release);
        self.frames_read += skipped as u64;
    }
}

impl TransportReader for SharedRingReader {
    /// Reads available frames and downmixes them to a mono chunk.
    fn poll(&mut self, max_frames: usize) -> Option<TransportChunk> {
        let frames = self.available_read().min(max_frames);
        if frames == 0 {
            return None;
        }

        let channel_count = self.segment.channels;
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.resize(frames * channel_count, 0.0);
        let count = self.read(&mut scratch, frames);

        let scale = 1.0 / channel_count as f32;
        let payload: Vec<f32> = scratch[..count * channel_count]
            .chunks_exact(channel_count)
            .map(|frame| frame.iter().sum::<f32>() * scale)
            .collect();
        self.scratch = scratch;

        let timestamp = self.frames_read - count as u64;
        Some(TransportChunk::new(payload, self.sample_rate, timestamp))
    }

    fn mode(&self) -> TransportMode {
        TransportMode::SharedRing
    }
}
