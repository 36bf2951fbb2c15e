//! Pooled capture color target

use crate::backend::traits::*;
use crate::backend::types::*;

/// Keeps at most one capture color target alive.
///
/// The texture is created the first frame it is requested with primitives and
/// reused on following frames. A frame without capture primitives releases it
/// so the memory is only paid for while something is captured.
#[derive(Debug)]
pub struct CaptureTargetPool {
    desc: TextureDescriptor,
    allocated: Option<TextureHandle>,
    next_texture_id: u64,
    allocations: u32,
}

impl CaptureTargetPool {
    pub fn new(desc: TextureDescriptor) -> Self {
        Self {
            desc,
            allocated: None,
            next_texture_id: 1,
            allocations: 0,
        }
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Currently held target, if any.
    pub fn current(&self) -> Option<TextureHandle> {
        self.allocated
    }

    /// How many times a texture had to be created.
    pub fn allocation_count(&self) -> u32 {
        self.allocations
    }

    /// Resize the target. A held texture is dropped and recreated on next use.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.desc.width == width && self.desc.height == height {
            return;
        }
        self.desc.width = width;
        self.desc.height = height;
        self.release();
    }

    fn release(&mut self) {
        if let Some(handle) = self.allocated.take() {
            log::debug!("Releasing capture target {:?}", handle);
        }
    }
}

impl CaptureTargetAllocator for CaptureTargetPool {
    fn request_custom_capture(&mut self, has_primitives: bool) -> CustomCaptureTextures {
        if !has_primitives {
            self.release();
            return CustomCaptureTextures::default();
        }

        let handle = match self.allocated {
            Some(handle) => handle,
            None => {
                let handle = TextureHandle(self.next_texture_id);
                self.next_texture_id += 1;
                self.allocations += 1;
                log::debug!(
                    "Allocating capture target {:?} ({}x{} {:?})",
                    handle,
                    self.desc.width,
                    self.desc.height,
                    self.desc.format
                );
                self.allocated = Some(handle);
                handle
            }
        };

        CustomCaptureTextures {
            custom_color: Some(handle),
        }
    }
}
