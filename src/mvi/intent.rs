/// Marker trait for actions a controller accepts: user navigation or data
/// reported back by the server.
pub trait Intent: Send + 'static {}
