use std::ops::Range;

use anyhow::{bail, Context, Result};

use crate::batch::FrameUniforms;
use crate::command::{CommandInstance, TextureId};

/// One batch recorded during a flush.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct PendingDraw {
    pub texture: TextureId,
    /// Index into [`BatchRecording::flushes`].
    pub flush: usize,
    pub instances: Range<u32>,
}

/// CPU-side record of every flush since the last encode or discard.
///
/// All flushes of a frame share `staged`; each draw keeps its slice of it and
/// the index of the flush whose uniforms it uses.
#[derive(Debug, Default)]
pub(super) struct BatchRecording {
    staged: Vec<CommandInstance>,
    flushes: Vec<FrameUniforms>,
    bound: Option<TextureId>,
    uploaded: Option<Range<u32>>,
    draws: Vec<PendingDraw>,
}

impl BatchRecording {
    pub fn begin_flush(&mut self, uniforms: &FrameUniforms) {
        self.flushes.push(*uniforms);
        self.bound = None;
        self.uploaded = None;
    }

    pub fn bind(&mut self, texture: TextureId) {
        self.bound = Some(texture);
    }

    pub fn upload(&mut self, instances: &[CommandInstance]) -> Result<()> {
        let start = u32::try_from(self.staged.len()).context("instance staging overflow")?;
        let end = u32::try_from(self.staged.len() + instances.len()).context("instance staging overflow")?;
        self.staged.extend_from_slice(instances);
        self.uploaded = Some(start..end);
        Ok(())
    }

    pub fn draw(&mut self, instance_count: u32) -> Result<()> {
        let Some(flush) = self.flushes.len().checked_sub(1) else {
            bail!("draw outside of a flush");
        };
        let Some(texture) = self.bound else {
            bail!("draw without a bound texture");
        };
        let Some(uploaded) = self.uploaded.take() else {
            bail!("draw without uploaded instances");
        };
        if instance_count > uploaded.end - uploaded.start {
            bail!("draw of {instance_count} instances exceeds upload of {}", uploaded.len());
        }

        self.draws.push(PendingDraw {
            texture,
            flush,
            instances: uploaded.start..uploaded.start + instance_count,
        });
        Ok(())
    }

    /// Forgets everything recorded so far.
    pub fn clear(&mut self) {
        self.staged.clear();
        self.flushes.clear();
        self.draws.clear();
        self.bound = None;
        self.uploaded = None;
    }

    #[inline]
    pub fn staged(&self) -> &[CommandInstance] {
        &self.staged
    }

    #[inline]
    pub fn flushes(&self) -> &[FrameUniforms] {
        &self.flushes
    }

    #[inline]
    pub fn draws(&self) -> &[PendingDraw] {
        &self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instances(n: usize) -> Vec<CommandInstance> {
        vec![bytemuck::Zeroable::zeroed(); n]
    }

    fn record_flush(rec: &mut BatchRecording, texture: u32, n: usize) {
        rec.begin_flush(&FrameUniforms::default());
        rec.bind(TextureId(texture));
        rec.upload(&instances(n)).unwrap();
        rec.draw(n as u32).unwrap();
    }

    #[test]
    fn flushes_share_one_staging_buffer() {
        let mut rec = BatchRecording::default();
        record_flush(&mut rec, 1, 3);
        record_flush(&mut rec, 2, 2);

        assert_eq!(rec.staged().len(), 5);
        assert_eq!(rec.flushes().len(), 2);
        assert_eq!(
            rec.draws(),
            &[
                PendingDraw { texture: TextureId(1), flush: 0, instances: 0..3 },
                PendingDraw { texture: TextureId(2), flush: 1, instances: 3..5 },
            ]
        );
    }

    #[test]
    fn clear_leaves_nothing_to_replay() {
        let mut rec = BatchRecording::default();
        record_flush(&mut rec, 1, 4);
        rec.clear();

        assert!(rec.staged().is_empty());
        assert!(rec.flushes().is_empty());
        assert!(rec.draws().is_empty());

        // The next frame starts from index zero again.
        record_flush(&mut rec, 3, 1);
        assert_eq!(rec.draws()[0].instances, 0..1);
        assert_eq!(rec.draws()[0].flush, 0);
    }

    #[test]
    fn draw_requires_flush_bind_and_upload() {
        let mut rec = BatchRecording::default();
        assert!(rec.draw(1).is_err());

        rec.begin_flush(&FrameUniforms::default());
        assert!(rec.draw(1).is_err());

        rec.bind(TextureId(1));
        assert!(rec.draw(1).is_err());

        rec.upload(&instances(2)).unwrap();
        assert!(rec.draw(3).is_err());
    }
}
