//! Window management using winit

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::core::error::Error;
use crate::core::Result;

/// Window configuration
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Sward".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl WindowConfig {
    fn attributes(&self) -> WindowAttributes {
        WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(PhysicalSize::new(self.width, self.height))
    }
}

/// Create the window from inside `ApplicationHandler::resumed`
pub fn create_window(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Arc<Window>> {
    let window = event_loop
        .create_window(config.attributes())
        .map_err(|e| Error::Window(format!("Failed to create window: {}", e)))?;
    let size = window.inner_size();
    log::info!("Window created: {}x{}", size.width, size.height);
    Ok(Arc::new(window))
}

/// Creates a polling event loop and runs the application
pub fn run<A: ApplicationHandler>(app: &mut A) -> Result<()> {
    let event_loop = EventLoop::new()
        .map_err(|e| Error::Window(format!("Failed to create event loop: {}", e)))?;

    event_loop.set_control_flow(ControlFlow::Poll);

    event_loop
        .run_app(app)
        .map_err(|e| Error::Window(format!("Event loop error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WindowConfig::default();
        assert_eq!(config.title, "Sward");
        assert!(config.width > 0 && config.height > 0);
    }
}
