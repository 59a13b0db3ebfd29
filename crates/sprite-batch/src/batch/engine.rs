use std::time::Instant;

use anyhow::Result;

use crate::command::{batch_order, CommandInstance, DrawRequest, RenderCommand, TextureId};
use crate::coords::Rect;

use super::metrics::measure;
use super::{FlushStats, FrameMetrics, FrameUniforms, RenderSink};

/// Default pool capacity (commands per flush).
pub const DEFAULT_MAX_COMMANDS: usize = 128_000;

/// Batching renderer core.
///
/// Performance characteristics:
/// - the command pool is allocated once; `submit()` is O(1) and never allocates
/// - `flush()` is one stable sort of the live prefix plus one linear scan
/// - the instance scratch buffer is reused across flushes
///
/// # Paint order
///
/// Commands are drawn by ascending z-index. Within one z-index, commands are
/// grouped by texture id to keep batches long, so two commands with equal z and
/// different textures have no defined relative order. Commands with equal z
/// and equal texture keep their submission order.
pub struct BatchEngine<S: RenderSink> {
    sink: S,

    pool: Box<[RenderCommand]>,
    count: usize,

    scissor: Option<Rect>,
    camera_scale: f32,
    camera_offset: [f32; 2],
    started: Instant,

    scratch: Vec<CommandInstance>,

    last_flush: FlushStats,
    metrics: FrameMetrics,
}

impl<S: RenderSink> BatchEngine<S> {
    /// Creates an engine whose pool holds `capacity` commands (at least one).
    pub fn new(sink: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            sink,
            pool: vec![RenderCommand::default(); capacity].into_boxed_slice(),
            count: 0,
            scissor: None,
            camera_scale: 1.0,
            camera_offset: [0.0, 0.0],
            started: Instant::now(),
            scratch: Vec::with_capacity(capacity.min(4096)),
            last_flush: FlushStats::default(),
            metrics: FrameMetrics::default(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    /// Number of commands waiting for the next flush.
    #[inline]
    pub fn pending(&self) -> usize {
        self.count
    }

    /// Queues a draw.
    ///
    /// When the pool is full the pending commands are flushed first, so this
    /// never fails for capacity reasons; an error here comes from the sink
    /// during that implicit flush.
    pub fn submit(&mut self, req: DrawRequest) -> Result<()> {
        if self.count >= self.pool.len() {
            self.flush()?;
        }

        self.pool[self.count] = RenderCommand::new(&req, self.scissor);
        self.count += 1;
        Ok(())
    }

    /// Sorts, partitions and draws every pending command, then resets the pool.
    ///
    /// No-op when nothing is pending. On a sink error the pending commands are
    /// dropped and the error is returned.
    pub fn flush(&mut self) -> Result<()> {
        if self.count == 0 {
            return Ok(());
        }

        let count = self.count;
        let ((), sort_time) = measure(|| self.pool[..count].sort_by(batch_order));

        let uniforms = FrameUniforms {
            time: self.started.elapsed().as_secs_f32(),
            camera_scale: self.camera_scale,
            camera_offset: self.camera_offset,
        };

        let (result, render_time) = measure(|| self.render_batches(count, &uniforms));
        self.count = 0;
        let draw_calls = result?;

        self.last_flush = FlushStats { commands: count, draw_calls, sort_time, render_time };
        self.metrics.record(&self.last_flush);

        log::trace!("flush: {count} commands, {draw_calls} draw calls");
        Ok(())
    }

    fn render_batches(&mut self, count: usize, uniforms: &FrameUniforms) -> Result<usize> {
        self.sink.begin_flush(uniforms)?;

        let mut draw_calls = 0;
        let mut start = 0;
        while start < count {
            let texture = self.pool[start].texture;
            let mut end = start + 1;
            while end < count && self.pool[end].texture == texture {
                end += 1;
            }

            self.scratch.clear();
            self.scratch.extend(self.pool[start..end].iter().map(|c| c.instance));

            self.sink.bind_texture(texture)?;
            self.sink.upload_instances(&self.scratch)?;
            self.sink.draw_instanced((end - start) as u32)?;

            draw_calls += 1;
            start = end;
        }

        Ok(draw_calls)
    }

    /// Sets the clip rect captured by subsequent submits. `None` disables clipping.
    #[inline]
    pub fn set_scissor(&mut self, scissor: Option<Rect>) {
        self.scissor = scissor;
    }

    #[inline]
    pub fn scissor(&self) -> Option<Rect> {
        self.scissor
    }

    #[inline]
    pub fn set_camera_scale(&mut self, scale: f32) {
        self.camera_scale = scale;
    }

    #[inline]
    pub fn set_camera_offset(&mut self, x: f32, y: f32) {
        self.camera_offset = [x, y];
    }

    /// Clears accumulated frame metrics. Call once at the start of each frame.
    #[inline]
    pub fn begin_frame(&mut self) {
        self.metrics.reset();
    }

    #[inline]
    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    #[inline]
    pub fn last_flush(&self) -> &FlushStats {
        &self.last_flush
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::testing::{RecordingSink, SinkEvent};
    use crate::command::{ZIndex, NO_SCISSOR};

    fn req(tex: u32, z: i32, tag: f32) -> DrawRequest {
        // `rect.x` carries a tag so tests can track individual commands.
        DrawRequest::new(TextureId(tex), Rect::new(tag, 0.0, 1.0, 1.0)).with_z(z)
    }

    fn engine(capacity: usize) -> BatchEngine<RecordingSink> {
        BatchEngine::new(RecordingSink::default(), capacity)
    }

    /// Texture ids of consecutive batches for a given command sequence, as
    /// `flush()` would emit them.
    fn expected_batches(cmds: &mut [RenderCommand]) -> Vec<TextureId> {
        cmds.sort_by(batch_order);
        let mut out: Vec<TextureId> = Vec::new();
        for c in cmds.iter() {
            if out.last() != Some(&c.texture) {
                out.push(c.texture);
            }
        }
        out
    }

    #[test]
    fn flush_without_commands_is_a_no_op() {
        let mut e = engine(8);
        e.flush().unwrap();
        assert!(e.sink().events.is_empty());
        assert_eq!(e.metrics().flushes, 0);
    }

    #[test]
    fn one_batch_per_run_of_equal_texture() {
        let mut e = engine(64);
        // z 0: textures 2, 1, 2 → sorted 1, 2, 2 → two runs
        // z 1: texture 1 → third run
        e.submit(req(2, 0, 0.0)).unwrap();
        e.submit(req(1, 0, 1.0)).unwrap();
        e.submit(req(2, 0, 2.0)).unwrap();
        e.submit(req(1, 1, 3.0)).unwrap();
        e.flush().unwrap();

        let batches = e.sink().batches();
        let textures: Vec<_> = batches.iter().map(|b| b.texture).collect();
        assert_eq!(textures, vec![TextureId(1), TextureId(2), TextureId(1)]);
        assert_eq!(e.last_flush().draw_calls, 3);
        assert_eq!(e.last_flush().commands, 4);
    }

    #[test]
    fn draw_count_matches_runs_for_mixed_sequence() {
        let mut e = engine(1024);
        let mut mirror = Vec::new();
        for i in 0..300u32 {
            let r = req(i % 5, (i % 7) as i32, i as f32);
            mirror.push(RenderCommand::new(&r, None));
            e.submit(r).unwrap();
        }
        e.flush().unwrap();

        let expected = expected_batches(&mut mirror);
        let got: Vec<_> = e.sink().batches().iter().map(|b| b.texture).collect();
        assert_eq!(got, expected);
        // 7 z-layers, 5 textures each
        assert_eq!(got.len(), 35);
    }

    #[test]
    fn equal_z_and_texture_keep_submission_order() {
        let mut e = engine(64);
        for tag in 0..10 {
            e.submit(req(4, 3, tag as f32)).unwrap();
            e.submit(req(1, 3, 100.0 + tag as f32)).unwrap();
        }
        e.flush().unwrap();

        let batches = e.sink().batches();
        assert_eq!(batches.len(), 2);
        let tags = |i: usize| -> Vec<f32> { batches[i].instances.iter().map(|c| c.rect[0]).collect() };
        assert_eq!(tags(0), (0..10).map(|t| 100.0 + t as f32).collect::<Vec<_>>());
        assert_eq!(tags(1), (0..10).map(|t| t as f32).collect::<Vec<_>>());
    }

    #[test]
    fn lower_z_is_drawn_first_regardless_of_texture() {
        let mut e = engine(8);
        e.submit(req(1, ZIndex::UI_TEXT.0, 0.0)).unwrap();
        e.submit(req(9, ZIndex::WORLD_BLOCKS.0, 1.0)).unwrap();
        e.flush().unwrap();

        let batches = e.sink().batches();
        assert_eq!(batches[0].texture, TextureId(9));
        assert_eq!(batches[1].texture, TextureId(1));
    }

    #[test]
    fn recycled_slots_render_only_new_commands() {
        let mut e = engine(16);
        for i in 0..10 {
            let mut r = req(7, 0, i as f32);
            r.rotation = 1.5;
            r.thickness = 9.0;
            e.submit(r).unwrap();
        }
        e.set_scissor(Some(Rect::new(1.0, 1.0, 5.0, 5.0)));
        e.submit(req(7, 0, 10.0)).unwrap();
        e.flush().unwrap();

        e.sink_mut().events.clear();
        e.set_scissor(None);
        e.submit(req(3, 0, 50.0)).unwrap();
        e.submit(req(3, 0, 51.0)).unwrap();
        e.flush().unwrap();

        let batches = e.sink().batches();
        assert_eq!(batches.len(), 1);
        let inst = &batches[0].instances;
        assert_eq!(inst.len(), 2);
        for c in inst {
            assert_eq!(c.rotation, 0.0);
            assert_eq!(c.thickness, 1.0);
            assert_eq!(c.scissor[0], NO_SCISSOR);
        }
        assert_eq!(inst[0].rect[0], 50.0);
        assert_eq!(inst[1].rect[0], 51.0);
    }

    #[test]
    fn full_pool_auto_flushes_before_append() {
        let capacity = 32;
        let mut e = engine(capacity);
        for i in 0..=capacity {
            e.submit(req(1, 0, i as f32)).unwrap();
        }
        assert_eq!(e.pending(), 1);
        e.flush().unwrap();

        let passes = e.sink().passes();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0], capacity);
        assert_eq!(passes[1], 1);

        // The overflow command is the last one submitted.
        let last = e.sink().batches().last().cloned().unwrap();
        assert_eq!(last.instances[0].rect[0], capacity as f32);
        assert_eq!(e.metrics().flushes, 2);
        assert_eq!(e.metrics().total_commands, capacity + 1);
    }

    #[test]
    fn scissor_is_captured_per_submit() {
        let mut e = engine(8);
        e.set_scissor(Some(Rect::new(2.0, 3.0, 4.0, 5.0)));
        e.submit(req(1, 0, 0.0)).unwrap();
        e.set_scissor(None);
        e.submit(req(1, 0, 1.0)).unwrap();
        e.flush().unwrap();

        let inst = &e.sink().batches()[0].instances;
        assert_eq!(inst[0].scissor, [2.0, 3.0, 4.0, 5.0]);
        assert_eq!(inst[1].scissor[0], NO_SCISSOR);
    }

    #[test]
    fn each_batch_binds_uploads_then_draws() {
        let mut e = engine(8);
        e.set_camera_scale(2.0);
        e.set_camera_offset(10.0, -4.0);
        e.submit(req(5, 0, 0.0)).unwrap();
        e.submit(req(5, 0, 1.0)).unwrap();
        e.flush().unwrap();

        let ev = &e.sink().events;
        assert!(matches!(ev[0], SinkEvent::Begin(u) if u.camera_scale == 2.0 && u.camera_offset == [10.0, -4.0]));
        assert!(matches!(ev[1], SinkEvent::Bind(TextureId(5))));
        assert!(matches!(&ev[2], SinkEvent::Upload(v) if v.len() == 2));
        assert!(matches!(ev[3], SinkEvent::Draw(2)));
        assert_eq!(ev.len(), 4);
    }

    #[test]
    fn sink_failure_propagates_and_resets_pool() {
        let mut e = engine(8);
        e.sink_mut().fail_draws = true;
        e.submit(req(1, 0, 0.0)).unwrap();
        assert!(e.flush().is_err());
        assert_eq!(e.pending(), 0);
        assert_eq!(e.metrics().flushes, 0);
    }

    #[test]
    fn begin_frame_resets_metrics() {
        let mut e = engine(8);
        e.submit(req(1, 0, 0.0)).unwrap();
        e.flush().unwrap();
        assert_eq!(e.metrics().draw_calls, 1);
        e.begin_frame();
        assert_eq!(e.metrics().draw_calls, 0);
        assert_eq!(e.last_flush().draw_calls, 1);
    }
}
