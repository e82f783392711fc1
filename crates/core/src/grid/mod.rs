//! Grid state, static layers and layer providers

pub mod cell;
pub mod fire_grid;
pub mod layers;
pub mod noise;
pub mod terrain;

// Re-export main types
pub use cell::{Cell, CellStatus, GridCoord};
pub use fire_grid::{CellAnomaly, Connectivity, Direction, FireGrid};
pub use layers::StaticLayers;
pub use noise::{NoiseGenerator, NoiseOctave};
pub use terrain::{LayerProvider, LayerSource, LengthUnit, RasterAdapter, Region, SyntheticTerrain};
