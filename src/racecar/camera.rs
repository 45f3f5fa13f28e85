use crate::cache::FrameCache;
use crate::config::CameraConfig;
use crate::dispatch::Dispatcher;
use crate::transport::Transport;
use crate::types::{ColorImage, DepthImage, Header};
use crate::wire::{CallFrame, ResponseShape};
use crate::Result;

/// Front camera: color and depth images.
pub struct Camera<'a, T> {
    dispatcher: &'a mut Dispatcher<T>,
    cache: &'a mut FrameCache,
    config: &'a CameraConfig,
}

impl<'a, T: Transport> Camera<'a, T> {
    pub(crate) fn new(
        dispatcher: &'a mut Dispatcher<T>,
        cache: &'a mut FrameCache,
        config: &'a CameraConfig,
    ) -> Self {
        Self { dispatcher, cache, config }
    }

    /// This frame's color image, fetched by bulk transfer on first access.
    pub fn color_image(self) -> Result<&'a ColorImage> {
        let Self { dispatcher, cache, config } = self;
        cache.color.get_or_fetch(|| {
            let frame = CallFrame::new(Header::CameraGetColorImage);
            let data = dispatcher.call_bulk(&frame, config.chunk_layout())?;
            Ok(ColorImage::new(config.width, config.height, data))
        })
    }

    /// This frame's depth image, fetched in one datagram on first access.
    pub fn depth_image(self) -> Result<&'a DepthImage> {
        let Self { dispatcher, cache, config } = self;
        cache.depth.get_or_fetch(|| {
            let frame = CallFrame::new(Header::CameraGetDepthImage);
            let shape = ResponseShape::FloatArray(config.depth_samples());
            let data = dispatcher.call(&frame, shape)?.into_floats()?;
            Ok(DepthImage::new(config.depth_width(), config.depth_height(), data))
        })
    }

    /// Configured color image width in pixels.
    pub fn width(&self) -> usize {
        self.config.width
    }

    /// Configured color image height in pixels.
    pub fn height(&self) -> usize {
        self.config.height
    }

    /// Ask the host for its camera width.
    pub fn query_width(&mut self) -> Result<i32> {
        self.dispatcher.call(&CallFrame::new(Header::CameraGetWidth), ResponseShape::Int)?.into_i32()
    }

    /// Ask the host for its camera height.
    pub fn query_height(&mut self) -> Result<i32> {
        self.dispatcher.call(&CallFrame::new(Header::CameraGetHeight), ResponseShape::Int)?.into_i32()
    }
}
