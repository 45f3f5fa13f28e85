use crate::dispatch::Dispatcher;
use crate::transport::Transport;
use crate::types::{Header, Vector3};
use crate::wire::{CallFrame, ResponseShape};
use crate::Result;

/// Inertial measurements in the car's local frame.
pub struct Physics<'a, T> {
    dispatcher: &'a mut Dispatcher<T>,
}

impl<'a, T: Transport> Physics<'a, T> {
    pub(crate) fn new(dispatcher: &'a mut Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    /// Linear acceleration in m/s².
    pub fn linear_acceleration(&mut self) -> Result<Vector3> {
        self.vector(Header::PhysicsGetLinearAcceleration)
    }

    /// Angular velocity in rad/s.
    pub fn angular_velocity(&mut self) -> Result<Vector3> {
        self.vector(Header::PhysicsGetAngularVelocity)
    }

    fn vector(&mut self, header: Header) -> Result<Vector3> {
        let xyz = self.dispatcher.call(&CallFrame::new(header), ResponseShape::Vector3)?.into_vector3()?;
        Ok(Vector3::from(xyz))
    }
}
