//! Material render proxies and per-feature-level material resources

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::UniformBufferHandle;
use crate::shader::ShaderMap;

/// Intended use of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialDomain {
    Surface,
    DeferredDecal,
    LightFunction,
    Volume,
    PostProcess,
    UserInterface,
}

/// Blend mode of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    Masked,
    Translucent,
    Additive,
    Modulate,
    AlphaComposite,
}

impl BlendMode {
    pub fn is_translucent(self) -> bool {
        !matches!(self, BlendMode::Opaque | BlendMode::Masked)
    }
}

/// Hardware feature level a material resource is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureLevel {
    Es31,
    Sm5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialResourceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialProxyId(pub u64);

fn next_material_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// A material compiled for one feature level, with its shader map.
#[derive(Debug)]
pub struct MaterialResource {
    id: MaterialResourceId,
    pub name: String,
    pub domain: MaterialDomain,
    pub blend_mode: BlendMode,
    pub two_sided: bool,
    pub wireframe: bool,
    pub uniform_buffer: UniformBufferHandle,
    shader_map: ShaderMap,
}

impl MaterialResource {
    pub fn new(name: &str, uniform_buffer: UniformBufferHandle) -> Self {
        Self {
            id: MaterialResourceId(next_material_id()),
            name: name.to_string(),
            domain: MaterialDomain::Surface,
            blend_mode: BlendMode::Opaque,
            two_sided: false,
            wireframe: false,
            uniform_buffer,
            shader_map: ShaderMap::default(),
        }
    }

    pub fn with_domain(mut self, domain: MaterialDomain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn id(&self) -> MaterialResourceId {
        self.id
    }

    pub fn is_translucent(&self) -> bool {
        self.blend_mode.is_translucent()
    }

    pub fn shader_map(&self) -> &ShaderMap {
        &self.shader_map
    }

    pub fn shader_map_mut(&mut self) -> &mut ShaderMap {
        &mut self.shader_map
    }
}

/// The renderer-side handle of a material instance.
///
/// Holds one resource per feature level it was compiled for and an optional
/// fallback proxy used when no usable resource exists.
#[derive(Debug)]
pub struct MaterialRenderProxy {
    id: MaterialProxyId,
    pub name: String,
    resources: HashMap<FeatureLevel, Arc<MaterialResource>>,
    fallback: Option<Arc<MaterialRenderProxy>>,
}

impl MaterialRenderProxy {
    pub fn new(name: &str) -> Self {
        Self {
            id: MaterialProxyId(next_material_id()),
            name: name.to_string(),
            resources: HashMap::new(),
            fallback: None,
        }
    }

    pub fn with_resource(mut self, feature_level: FeatureLevel, resource: Arc<MaterialResource>) -> Self {
        self.resources.insert(feature_level, resource);
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<MaterialRenderProxy>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn id(&self) -> MaterialProxyId {
        self.id
    }

    pub fn resource(&self, feature_level: FeatureLevel) -> Option<&Arc<MaterialResource>> {
        self.resources.get(&feature_level)
    }

    /// Find a usable resource, walking the fallback chain.
    ///
    /// Returns the proxy that actually supplied the resource alongside it.
    pub fn material_with_fallback(
        &self,
        feature_level: FeatureLevel,
    ) -> Option<(&MaterialRenderProxy, &Arc<MaterialResource>)> {
        let mut proxy = self;
        loop {
            if let Some(resource) = proxy.resource(feature_level) {
                return Some((proxy, resource));
            }
            proxy = proxy.fallback.as_deref()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translucent_blend_modes() {
        assert!(!BlendMode::Opaque.is_translucent());
        assert!(!BlendMode::Masked.is_translucent());
        assert!(BlendMode::Translucent.is_translucent());
        assert!(BlendMode::Additive.is_translucent());
        assert!(BlendMode::Modulate.is_translucent());
        assert!(BlendMode::AlphaComposite.is_translucent());
    }

    #[test]
    fn fallback_is_taken_when_level_missing() {
        let default_resource = Arc::new(MaterialResource::new("default", UniformBufferHandle::new(1)));
        let default = Arc::new(
            MaterialRenderProxy::new("default").with_resource(FeatureLevel::Es31, default_resource.clone()),
        );
        let sm5_only = MaterialRenderProxy::new("sm5_only")
            .with_resource(
                FeatureLevel::Sm5,
                Arc::new(MaterialResource::new("sm5", UniformBufferHandle::new(2))),
            )
            .with_fallback(default.clone());

        let (proxy, resource) = sm5_only
            .material_with_fallback(FeatureLevel::Es31)
            .expect("fallback resource");
        assert_eq!(proxy.id(), default.id());
        assert_eq!(resource.id(), default_resource.id());

        let (proxy, _) = sm5_only
            .material_with_fallback(FeatureLevel::Sm5)
            .expect("own resource");
        assert_eq!(proxy.id(), sm5_only.id());
    }

    #[test]
    fn no_resource_anywhere() {
        let proxy = MaterialRenderProxy::new("empty");
        assert!(proxy.material_with_fallback(FeatureLevel::Es31).is_none());
    }
}
