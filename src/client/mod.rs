mod delivery;
mod generator;

pub use delivery::DeliveryClient;
pub use generator::GeneratorClient;
