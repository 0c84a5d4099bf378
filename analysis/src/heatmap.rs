use std::collections::HashMap;

use common::{HeatmapPoint, Position};

pub struct Config {
    /// Edge length of a quantisation cell in world units. `0.1` keeps one decimal place.
    pub cell_size: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self { cell_size: 0.1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Kill,
    Death,
    BombPlanted,
    BombExploded,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kill => "kill",
            Self::Death => "death",
            Self::BombPlanted => "bomb_planted",
            Self::BombExploded => "bomb_exploded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct CellKey {
    kind: EventKind,
    x: i64,
    y: i64,
    z: i64,
}

#[derive(Debug, Clone)]
struct Cell {
    position: Position,
    intensity: u32,
}

/// Event density keyed by quantised position and event type.
#[derive(Debug)]
pub struct HeatMap {
    cell_size: f64,
    cells: HashMap<CellKey, Cell>,
}

impl HeatMap {
    pub fn new(config: &Config) -> Self {
        Self {
            cell_size: config.cell_size,
            cells: HashMap::new(),
        }
    }

    fn quantize(&self, value: f64) -> i64 {
        (value / self.cell_size).round() as i64
    }

    pub fn add_point(&mut self, position: Position, kind: EventKind) {
        let key = CellKey {
            kind,
            x: self.quantize(position.x),
            y: self.quantize(position.y),
            z: self.quantize(position.z),
        };
        let cell_size = self.cell_size;

        let cell = self.cells.entry(key).or_insert_with(|| Cell {
            position: Position::new(
                key.x as f64 * cell_size,
                key.y as f64 * cell_size,
                key.z as f64 * cell_size,
            ),
            intensity: 0,
        });
        cell.intensity += 1;

        tracing::trace!(?position, kind = kind.as_str(), intensity = cell.intensity, "Heatmap point");
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total_intensity(&self) -> u32 {
        self.cells.values().map(|c| c.intensity).sum()
    }

    pub fn intensity_at(&self, position: Position, kind: EventKind) -> u32 {
        let key = CellKey {
            kind,
            x: self.quantize(position.x),
            y: self.quantize(position.y),
            z: self.quantize(position.z),
        };
        self.cells.get(&key).map(|c| c.intensity).unwrap_or(0)
    }

    /// Points sorted by event type and position, so output is reproducible.
    pub fn points(&self) -> Vec<HeatmapPoint> {
        let mut cells: Vec<_> = self.cells.iter().collect();
        cells.sort_unstable_by_key(|(key, _)| **key);

        cells
            .into_iter()
            .map(|(key, cell)| HeatmapPoint {
                x: cell.position.x,
                y: cell.position.y,
                z: cell.position.z,
                intensity: cell.intensity,
                kind: key.kind.as_str().to_owned(),
            })
            .collect()
    }

    /// Projects the points of the given kinds (all if empty) onto a 2D grid with
    /// `grid_size` world units per cell.
    pub fn rasterize(&self, grid_size: f64, kinds: &[EventKind]) -> Raster {
        let selected: Vec<&Cell> = self
            .cells
            .iter()
            .filter(|(key, _)| kinds.is_empty() || kinds.contains(&key.kind))
            .map(|(_, cell)| cell)
            .collect();

        let min_x = selected.iter().map(|c| c.position.x).fold(f64::INFINITY, f64::min);
        let min_y = selected.iter().map(|c| c.position.y).fold(f64::INFINITY, f64::min);

        let mut raster = Raster::new();
        for cell in selected {
            let x = ((cell.position.x - min_x) / grid_size) as usize;
            let y = ((cell.position.y - min_y) / grid_size) as usize;
            raster.add(x, y, cell.intensity as usize);
        }

        raster
    }
}

/// A dense 2D grid of accumulated intensities.
pub struct Raster {
    max_x: usize,
    max_y: usize,
    max_value: usize,
    rows: Vec<Vec<usize>>,
}

impl Raster {
    fn new() -> Self {
        Self {
            max_x: 0,
            max_y: 0,
            max_value: 0,
            rows: Vec::new(),
        }
    }

    fn add(&mut self, x: usize, y: usize, value: usize) {
        if self.rows.len() <= y {
            self.rows.resize(y + 1, Vec::new());
        }
        self.max_y = self.max_y.max(y);

        let row = &mut self.rows[y];
        if row.len() <= x {
            row.resize(x + 1, 0);
        }
        self.max_x = self.max_x.max(x);

        let cell = &mut row[x];
        *cell += value;

        self.max_value = self.max_value.max(*cell);
    }

    pub fn width(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            self.max_x + 1
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, x: usize, y: usize) -> usize {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(0)
    }

    /// Red channel scaled to the hottest cell. Rows are flipped so that +y points up.
    pub fn as_image(&self) -> image::RgbImage {
        let width = self.width().max(1) as u32;
        let height = self.height().max(1) as u32;
        let mut buffer = image::RgbImage::new(width, height);

        tracing::trace!("Creating Image with Dimensions: {}x{}", buffer.width(), buffer.height());

        let max_value = self.max_value.max(1) as f64;
        for (y, row) in self.rows.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let value = ((*cell as f64 / max_value) * 255.0).round() as u8;
                buffer.put_pixel(x as u32, height - 1 - y as u32, image::Rgb([value, 0, 0]));
            }
        }

        buffer
    }
}

impl core::fmt::Display for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.max_value.max(1).ilog10() as usize + 1;

        for row in self.rows.iter() {
            for cell in row.iter().copied() {
                write!(f, "{: ^width$} ", cell, width = size)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
