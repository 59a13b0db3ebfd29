//! In-memory sink and texture factory for unit tests.

use anyhow::{bail, Result};

use crate::command::{CommandInstance, TextureId};

use super::{FrameUniforms, RenderSink, TextureFactory};

#[derive(Debug, Clone)]
pub enum SinkEvent {
    Begin(FrameUniforms),
    Bind(TextureId),
    Upload(Vec<CommandInstance>),
    Draw(u32),
}

/// One bind/upload/draw triple as seen by the sink.
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub texture: TextureId,
    pub instances: Vec<CommandInstance>,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub fail_draws: bool,
}

impl RecordingSink {
    /// Batches in draw order.
    pub fn batches(&self) -> Vec<RecordedBatch> {
        let mut out = Vec::new();
        let mut bound = None;
        let mut uploaded: &[CommandInstance] = &[];
        for ev in &self.events {
            match ev {
                SinkEvent::Begin(_) => {}
                SinkEvent::Bind(t) => bound = Some(*t),
                SinkEvent::Upload(v) => uploaded = v,
                SinkEvent::Draw(n) => {
                    assert_eq!(*n as usize, uploaded.len(), "draw count != uploaded instances");
                    out.push(RecordedBatch {
                        texture: bound.unwrap_or_default(),
                        instances: uploaded.to_vec(),
                    });
                }
            }
        }
        out
    }

    /// Instances drawn per flush.
    pub fn passes(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for ev in &self.events {
            match ev {
                SinkEvent::Begin(_) => out.push(0),
                SinkEvent::Draw(n) => {
                    if let Some(last) = out.last_mut() {
                        *last += *n as usize;
                    }
                }
                _ => {}
            }
        }
        out
    }
}

impl RenderSink for RecordingSink {
    fn begin_flush(&mut self, uniforms: &FrameUniforms) -> Result<()> {
        self.events.push(SinkEvent::Begin(*uniforms));
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureId) -> Result<()> {
        self.events.push(SinkEvent::Bind(texture));
        Ok(())
    }

    fn upload_instances(&mut self, instances: &[CommandInstance]) -> Result<()> {
        self.events.push(SinkEvent::Upload(instances.to_vec()));
        Ok(())
    }

    fn draw_instanced(&mut self, instance_count: u32) -> Result<()> {
        if self.fail_draws {
            bail!("device lost");
        }
        self.events.push(SinkEvent::Draw(instance_count));
        Ok(())
    }
}

/// Hands out sequential ids and keeps the uploaded pixels.
#[derive(Debug, Default)]
pub struct FakeTextures {
    pub next: u32,
    pub live: Vec<(TextureId, u32, u32, Vec<u8>)>,
    pub released: Vec<TextureId>,
}

impl FakeTextures {
    pub fn get(&self, id: TextureId) -> Option<&(TextureId, u32, u32, Vec<u8>)> {
        self.live.iter().find(|t| t.0 == id)
    }
}

impl TextureFactory for FakeTextures {
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId> {
        assert_eq!(rgba.len(), (width * height * 4) as usize);
        self.next += 1;
        let id = TextureId(self.next);
        self.live.push((id, width, height, rgba.to_vec()));
        Ok(id)
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.live.retain(|t| t.0 != texture);
        self.released.push(texture);
    }
}
