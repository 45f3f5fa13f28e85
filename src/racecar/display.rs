use crate::types::{ColorImage, DepthImage};

/// Where images passed to [`Display`] end up.
///
/// The simulation host has no screen for the client, so showing an image is a
/// local concern. Plug in a window, a file writer, or a test recorder.
pub trait DisplaySink {
    fn show_image(&mut self, image: &ColorImage) -> anyhow::Result<()>;

    /// Depth images are dropped unless the sink opts in.
    fn show_depth_image(&mut self, _image: &DepthImage) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Discards every image.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn show_image(&mut self, _image: &ColorImage) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Local image output. Never touches the wire.
pub struct Display<'a> {
    sink: &'a mut dyn DisplaySink,
}

impl<'a> Display<'a> {
    pub(crate) fn new(sink: &'a mut dyn DisplaySink) -> Self {
        Self { sink }
    }

    pub fn show_image(&mut self, image: &ColorImage) -> anyhow::Result<()> {
        self.sink.show_image(image)
    }

    pub fn show_depth_image(&mut self, image: &DepthImage) -> anyhow::Result<()> {
        self.sink.show_depth_image(image)
    }
}
