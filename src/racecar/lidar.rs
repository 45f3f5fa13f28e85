use crate::cache::FrameCache;
use crate::config::LidarConfig;
use crate::dispatch::Dispatcher;
use crate::transport::Transport;
use crate::types::{Header, LidarScan};
use crate::wire::{CallFrame, ResponseShape};
use crate::Result;

/// 360 degree range finder.
pub struct Lidar<'a, T> {
    dispatcher: &'a mut Dispatcher<T>,
    cache: &'a mut FrameCache,
    config: &'a LidarConfig,
}

impl<'a, T: Transport> Lidar<'a, T> {
    pub(crate) fn new(
        dispatcher: &'a mut Dispatcher<T>,
        cache: &'a mut FrameCache,
        config: &'a LidarConfig,
    ) -> Self {
        Self { dispatcher, cache, config }
    }

    /// This frame's scan, fetched in one datagram on first access.
    pub fn ranges(self) -> Result<&'a LidarScan> {
        let Self { dispatcher, cache, config } = self;
        cache.lidar.get_or_fetch(|| {
            let frame = CallFrame::new(Header::LidarGetSamples);
            let shape = ResponseShape::FloatArray(config.num_samples);
            let samples = dispatcher.call(&frame, shape)?.into_floats()?;
            Ok(LidarScan { samples })
        })
    }

    /// Configured samples per scan.
    pub fn num_samples(&self) -> usize {
        self.config.num_samples
    }

    /// Ask the host how many samples it produces per scan.
    pub fn query_num_samples(&mut self) -> Result<i32> {
        let frame = CallFrame::new(Header::LidarGetNumSamples);
        self.dispatcher.call(&frame, ResponseShape::Int)?.into_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedTransport;
    use crate::wire::Response;

    #[test]
    fn two_reads_one_fetch() {
        let config = LidarConfig::default();
        let scan: Vec<f32> = (0..720).map(|i| i as f32 * 0.5).collect();
        let mut script = ScriptedTransport::default();
        script.push_response(&Response::FloatArray(scan));
        let mut dispatcher = Dispatcher::new(script);
        let mut cache = FrameCache::default();

        let first = Lidar::new(&mut dispatcher, &mut cache, &config).ranges().unwrap().clone();
        let second = Lidar::new(&mut dispatcher, &mut cache, &config).ranges().unwrap();

        assert_eq!(&first, second);
        assert_eq!(second.len(), 720);
        assert_eq!(second.at_angle(90.0), Some(90.0));
        assert_eq!(dispatcher.transport().count_sent(Header::LidarGetSamples), 1);
    }

    #[test]
    fn num_samples_from_config_and_host() {
        let config = LidarConfig { num_samples: 360 };
        let mut script = ScriptedTransport::default();
        script.push_response(&Response::Int(720));
        let mut dispatcher = Dispatcher::new(script);
        let mut cache = FrameCache::default();
        let mut lidar = Lidar::new(&mut dispatcher, &mut cache, &config);

        assert_eq!(lidar.num_samples(), 360);
        assert_eq!(lidar.query_num_samples().unwrap(), 720);
    }
}
