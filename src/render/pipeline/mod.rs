//! Render pipelines

pub mod blade;
pub mod blade_shadow;
pub mod param_pass;

pub use blade::BladePipeline;
pub use blade_shadow::BladeShadowPipeline;
pub use param_pass::ParamPassPipeline;

/// Parse and validate a complete WGSL module without a device.
#[cfg(test)]
pub(crate) fn validate_wgsl(source: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| format!("WGSL parse error: {}", e.emit_to_string(source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(())
}
