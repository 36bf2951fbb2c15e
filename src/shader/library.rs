//! WGSL shader library backed by naga
//!
//! The capture pass source is parsed and validated once. Parameter maps are
//! reflected per entry point from the globals that entry point actually uses,
//! so a stage only reports the bindings it can consume.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CaptureError, CaptureResult};
use crate::resources::{MaterialResource, VertexFactoryFilter, VertexFactoryType};
use crate::shader::{
    CompiledShader, PermutationParameters, ShaderId, ShaderParameter, ShaderParameterMap,
    ShaderPlatform, ShaderType, CAPTURE_PASS_SHADER,
};

/// Reflection result of one entry point
#[derive(Debug, Clone, Default)]
struct ReflectedStage {
    parameters: ShaderParameterMap,
    writes_second_blend_source: bool,
}

/// Compiles capture pass permutations for one platform.
#[derive(Debug)]
pub struct ShaderLibrary {
    platform: ShaderPlatform,
    label: String,
    stages: HashMap<ShaderType, ReflectedStage>,
}

impl ShaderLibrary {
    /// Library for the built-in capture pass shader.
    pub fn new(platform: ShaderPlatform) -> CaptureResult<Self> {
        Self::from_wgsl(platform, "CapturePass", CAPTURE_PASS_SHADER)
    }

    /// Library for a custom WGSL source exposing `main_vs` and `main_ps`.
    pub fn from_wgsl(platform: ShaderPlatform, label: &str, source: &str) -> CaptureResult<Self> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| {
            CaptureError::ShaderCompilation {
                shader: label.to_string(),
                message: e.emit_to_string(source),
            }
        })?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        let module_info = validator
            .validate(&module)
            .map_err(|e| CaptureError::ShaderCompilation {
                shader: label.to_string(),
                message: format!("Validation error: {e}"),
            })?;

        let mut stages = HashMap::new();
        for shader_type in ShaderType::ALL {
            let stage = reflect_entry_point(&module, &module_info, shader_type)?;
            log::debug!(
                "Reflected {} parameters for {}::{} (second blend source: {})",
                stage.parameters.len(),
                label,
                shader_type.entry_point(),
                stage.writes_second_blend_source
            );
            stages.insert(shader_type, stage);
        }

        Ok(Self {
            platform,
            label: label.to_string(),
            stages,
        })
    }

    pub fn platform(&self) -> ShaderPlatform {
        self.platform
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parameters(&self, shader_type: ShaderType) -> Option<&ShaderParameterMap> {
        self.stages.get(&shader_type).map(|stage| &stage.parameters)
    }

    /// Whether the entry point outputs a second color for dual source blending.
    pub fn writes_second_blend_source(&self, shader_type: ShaderType) -> bool {
        self.stages
            .get(&shader_type)
            .is_some_and(|stage| stage.writes_second_blend_source)
    }

    /// Compile one permutation. Does not consult the permutation filter.
    pub fn compile(
        &self,
        shader_type: ShaderType,
        vertex_factory: VertexFactoryType,
    ) -> CaptureResult<Arc<CompiledShader>> {
        let stage = self
            .stages
            .get(&shader_type)
            .cloned()
            .ok_or_else(|| CaptureError::MissingEntryPoint(shader_type.entry_point().to_string()))?;

        Ok(Arc::new(CompiledShader {
            id: ShaderId::next(),
            shader_type,
            vertex_factory,
            platform: self.platform,
            parameters: stage.parameters,
            writes_second_blend_source: stage.writes_second_blend_source,
        }))
    }

    /// Fill the material's shader map with every permutation that should exist.
    ///
    /// Returns the number of permutations compiled. Skipped permutations are
    /// not an error.
    pub fn compile_material_shaders(
        &self,
        material: &mut MaterialResource,
        filter: &VertexFactoryFilter,
    ) -> CaptureResult<usize> {
        let mut compiled = 0;
        for vertex_factory in VertexFactoryType::ALL {
            let permutation = PermutationParameters {
                platform: self.platform,
                vertex_factory: Some(vertex_factory),
            };
            for shader_type in ShaderType::ALL {
                if !shader_type.should_compile_permutation(&permutation, filter) {
                    continue;
                }
                let shader = self.compile(shader_type, vertex_factory)?;
                material.shader_map_mut().insert(shader);
                compiled += 1;
            }
        }

        log::debug!(
            "Compiled {} capture pass permutations for material '{}' on {:?}",
            compiled,
            material.name,
            self.platform
        );
        Ok(compiled)
    }
}

fn reflect_entry_point(
    module: &naga::Module,
    module_info: &naga::valid::ModuleInfo,
    shader_type: ShaderType,
) -> CaptureResult<ReflectedStage> {
    let stage = shader_type.frequency().naga_stage();
    let index = module
        .entry_points
        .iter()
        .position(|ep| ep.name == shader_type.entry_point() && ep.stage == stage)
        .ok_or_else(|| CaptureError::MissingEntryPoint(shader_type.entry_point().to_string()))?;
    let entry_point = &module.entry_points[index];

    let function_info = module_info.get_entry_point(index);
    let mut parameters = ShaderParameterMap::default();
    for (handle, global) in module.global_variables.iter() {
        if function_info[handle].is_empty() {
            continue;
        }
        if let (Some(name), Some(binding)) = (&global.name, &global.binding) {
            parameters.insert(
                name.clone(),
                ShaderParameter {
                    group: binding.group,
                    binding: binding.binding,
                },
            );
        }
    }

    Ok(ReflectedStage {
        parameters,
        writes_second_blend_source: writes_second_blend_source(module, &entry_point.function),
    })
}

fn writes_second_blend_source(module: &naga::Module, function: &naga::Function) -> bool {
    let is_second = |binding: &Option<naga::Binding>| {
        matches!(
            binding,
            Some(naga::Binding::Location {
                second_blend_source: true,
                ..
            })
        )
    };

    let Some(result) = &function.result else {
        return false;
    };
    if is_second(&result.binding) {
        return true;
    }
    match &module.types[result.ty].inner {
        naga::TypeInner::Struct { members, .. } => members.iter().any(|m| is_second(&m.binding)),
        _ => false,
    }
}
