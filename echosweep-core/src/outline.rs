//! Перевод записей журнала в декартовы точки для построения контура.
//!
//! Индекс угла `a` из `N` даёт `θ = 2π·a/N` (для Ping360, N = 400, это
//! грады). Записи группируются в слои по подряд идущим значениям глубины.

use std::{f64::consts::TAU, io::Write};

use echosweep_types::{AngleRecord, SonarError, SonarResult};

/// Точка контура в метрах относительно головки сонара.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinePoint {
    pub x: f64,
    pub y: f64,
}

/// Ограничивающий прямоугольник слоя.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Все точки одной глубины.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthLayer {
    pub depth: u32,
    pub points: Vec<OutlinePoint>,
    pub bounds: Bounds,
}

impl Bounds {
    fn from_points(points: &[OutlinePoint]) -> Self {
        points.iter().fold(
            Bounds {
                min_x: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                min_y: f64::INFINITY,
                max_y: f64::NEG_INFINITY,
            },
            |b, p| Bounds {
                min_x: b.min_x.min(p.x),
                max_x: b.max_x.max(p.x),
                min_y: b.min_y.min(p.y),
                max_y: b.max_y.max(p.y),
            },
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Угол обзора в радианах.
pub fn angle_to_radians(
    angle: u16,
    angle_count: u16,
) -> SonarResult<f64> {
    if angle_count == 0 {
        return Err(SonarError::invalid_record("angle count must be positive"));
    }

    Ok(TAU * angle as f64 / angle_count as f64)
}

/// Переводит запись в декартову точку.
pub fn to_point(
    record: &AngleRecord,
    angle_count: u16,
) -> SonarResult<OutlinePoint> {
    let theta = angle_to_radians(record.angle, angle_count)?;

    Ok(OutlinePoint {
        x: record.distance_m * theta.cos(),
        y: record.distance_m * theta.sin(),
    })
}

/// Группирует записи в слои по подряд идущей глубине.
pub fn outline_layers(
    records: &[AngleRecord],
    angle_count: u16,
) -> SonarResult<Vec<DepthLayer>> {
    let mut layers: Vec<DepthLayer> = Vec::new();
    let mut current: Option<(u32, Vec<OutlinePoint>)> = None;

    for record in records {
        let point = to_point(record, angle_count)?;

        if let Some((depth, points)) = current.as_mut() {
            if *depth == record.depth {
                points.push(point);
                continue;
            }
        }

        if let Some((depth, points)) = current.take() {
            layers.push(make_layer(depth, points));
        }
        current = Some((record.depth, vec![point]));
    }

    if let Some((depth, points)) = current {
        layers.push(make_layer(depth, points));
    }

    Ok(layers)
}

fn make_layer(
    depth: u32,
    points: Vec<OutlinePoint>,
) -> DepthLayer {
    let bounds = Bounds::from_points(&points);

    DepthLayer {
        depth,
        points,
        bounds,
    }
}

/// Пишет слои в CSV `Depth,X,Y`.
pub fn write_outline_csv<W: Write>(
    layers: &[DepthLayer],
    mut out: W,
) -> SonarResult<()> {
    writeln!(out, "Depth,X,Y")?;

    for layer in layers {
        for p in &layer.points {
            writeln!(out, "{},{:.4},{:.4}", layer.depth, p.x, p.y)?;
        }
    }

    out.flush()?;
    Ok(())
}
