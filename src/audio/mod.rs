pub mod rodio_engine;

pub use rodio_engine::RodioEngine;
