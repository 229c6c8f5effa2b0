//! Node placement for the plot backend. Every layout returns one position per
//! node index, rescaled into `[-1, 1]` on both axes.

use std::f64::consts::TAU;

use petgraph::graph::UnGraph;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::warn;

use crate::domain::types::Layout;

pub type Position = (f64, f64);

const LAYOUT_SEED: u64 = 42;
const SPRING_ITERATIONS: usize = 50;
const MIN_DISTANCE: f64 = 0.01;
const SPECTRAL_MAX_NODES: usize = 400;
const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-12;

pub fn compute<N, E>(graph: &UnGraph<N, E>, layout: Layout) -> Vec<Position> {
    let positions = match layout {
        Layout::Spring => spring(graph),
        Layout::Circular => circular(graph.node_count()),
        Layout::Random => random(graph.node_count()),
        Layout::Shell => shell(graph),
        Layout::Spectral => spectral(graph),
    };
    rescale(positions)
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(LAYOUT_SEED)
}

fn random(n: usize) -> Vec<Position> {
    let mut rng = rng();
    (0..n).map(|_| (rng.r#gen::<f64>(), rng.r#gen::<f64>())).collect()
}

fn circular(n: usize) -> Vec<Position> {
    if n == 1 {
        return vec![(0.0, 0.0)];
    }
    (0..n)
        .map(|i| {
            let theta = TAU * i as f64 / n as f64;
            (theta.cos(), theta.sin())
        })
        .collect()
}

/// Fruchterman-Reingold with a linearly cooling step size.
fn spring<N, E>(graph: &UnGraph<N, E>) -> Vec<Position> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![(0.0, 0.0); n];
    }
    let mut pos = random(n);
    let k = (1.0 / n as f64).sqrt();
    let edges: Vec<(usize, usize)> = graph
        .edge_indices()
        .filter_map(|edge| graph.edge_endpoints(edge))
        .map(|(a, b)| (a.index(), b.index()))
        .filter(|(a, b)| a != b)
        .collect();

    let span = |axis: fn(&Position) -> f64| {
        let (lo, hi) = pos.iter().map(axis).fold((f64::MAX, f64::MIN), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        hi - lo
    };
    let mut temperature = span(|p| p.0).max(span(|p| p.1)) * 0.1;
    let cooling = temperature / (SPRING_ITERATIONS as f64 + 1.0);

    for _ in 0..SPRING_ITERATIONS {
        let mut disp = vec![(0.0_f64, 0.0_f64); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (dx, dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                let dist = dx.hypot(dy).max(MIN_DISTANCE);
                let force = k * k / (dist * dist);
                disp[i].0 += dx * force;
                disp[i].1 += dy * force;
            }
        }
        for &(a, b) in &edges {
            let (dx, dy) = (pos[a].0 - pos[b].0, pos[a].1 - pos[b].1);
            let dist = dx.hypot(dy).max(MIN_DISTANCE);
            let force = dist / k;
            disp[a].0 -= dx * force;
            disp[a].1 -= dy * force;
            disp[b].0 += dx * force;
            disp[b].1 += dy * force;
        }
        for (p, d) in pos.iter_mut().zip(&disp) {
            let length = d.0.hypot(d.1);
            let length = if length < MIN_DISTANCE { 0.1 } else { length };
            p.0 += d.0 * temperature / length;
            p.1 += d.1 * temperature / length;
        }
        temperature -= cooling;
    }
    pos
}

/// Concentric rings grouped by degree, busiest nodes innermost.
fn shell<N, E>(graph: &UnGraph<N, E>) -> Vec<Position> {
    let n = graph.node_count();
    let mut by_degree: Vec<(usize, usize)> = graph
        .node_indices()
        .map(|node| (node.index(), graph.neighbors(node).count()))
        .collect();
    by_degree.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut shells: Vec<Vec<usize>> = Vec::new();
    let mut last_degree = None;
    for (index, degree) in by_degree {
        if last_degree != Some(degree) {
            shells.push(Vec::new());
            last_degree = Some(degree);
        }
        if let Some(current) = shells.last_mut() {
            current.push(index);
        }
    }

    let mut pos = vec![(0.0, 0.0); n];
    if shells.is_empty() {
        return pos;
    }
    let bump = 1.0 / shells.len() as f64;
    let mut radius = if shells[0].len() == 1 { 0.0 } else { bump };
    for ring in &shells {
        for (slot, &index) in ring.iter().enumerate() {
            let theta = TAU * slot as f64 / ring.len() as f64;
            pos[index] = (radius * theta.cos(), radius * theta.sin());
        }
        radius += bump;
    }
    pos
}

/// Second and third eigenvectors of the graph Laplacian.
fn spectral<N, E>(graph: &UnGraph<N, E>) -> Vec<Position> {
    let n = graph.node_count();
    if n < 3 {
        return circular(n);
    }
    if n > SPECTRAL_MAX_NODES {
        warn!(
            target = "application::plot::layout",
            op = "layout::spectral",
            result = "fallback",
            nodes = n,
            "Graph too large for dense spectral layout; using spring layout"
        );
        return spring(graph);
    }

    let mut laplacian = vec![vec![0.0_f64; n]; n];
    for edge in graph.edge_indices() {
        let Some((a, b)) = graph.edge_endpoints(edge) else {
            continue;
        };
        let (a, b) = (a.index(), b.index());
        if a == b {
            continue;
        }
        laplacian[a][b] -= 1.0;
        laplacian[b][a] -= 1.0;
        laplacian[a][a] += 1.0;
        laplacian[b][b] += 1.0;
    }

    let (values, vectors) = jacobi_eigen(laplacian);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let (ux, uy) = (order[1], order[2]);
    (0..n).map(|i| (vectors[i][ux], vectors[i][uy])).collect()
}

/// Cyclic Jacobi rotation for a dense symmetric matrix. Returns eigenvalues
/// and a matrix whose columns are the matching eigenvectors.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v = vec![vec![0.0_f64; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (p + 1..n).map(move |q| (p, q)))
            .map(|(p, q)| a[p][q] * a[p][q])
            .sum();
        if off < JACOBI_TOLERANCE {
            break;
        }
        for p in 0..n {
            for q in p + 1..n {
                if a[p][q].abs() < f64::EPSILON {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for k in 0..n {
                    let (akp, akq) = (a[k][p], a[k][q]);
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = (0..n).map(|i| a[i][i]).collect();
    (values, v)
}

/// Center on the mean and scale so the largest coordinate magnitude is 1.
fn rescale(mut positions: Vec<Position>) -> Vec<Position> {
    if positions.is_empty() {
        return positions;
    }
    let count = positions.len() as f64;
    let (sx, sy) = positions
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.0, sy + p.1));
    let (mx, my) = (sx / count, sy / count);
    let mut extent: f64 = 0.0;
    for p in positions.iter_mut() {
        p.0 -= mx;
        p.1 -= my;
        extent = extent.max(p.0.abs()).max(p.1.abs());
    }
    if extent > f64::EPSILON {
        for p in positions.iter_mut() {
            p.0 /= extent;
            p.1 /= extent;
        }
    } else {
        positions.iter_mut().for_each(|p| *p = (0.0, 0.0));
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(n: usize) -> UnGraph<(), ()> {
        let mut graph = UnGraph::new_undirected();
        let nodes: Vec<_> = (0..n).map(|_| graph.add_node(())).collect();
        for pair in nodes.windows(2) {
            graph.add_edge(pair[0], pair[1], ());
        }
        graph
    }

    fn assert_in_unit_box(positions: &[Position]) {
        for &(x, y) in positions {
            assert!(x.is_finite() && y.is_finite(), "non-finite position ({x}, {y})");
            assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&x), "x out of range: {x}");
            assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&y), "y out of range: {y}");
        }
    }

    #[test]
    fn every_layout_stays_within_unit_box() {
        let graph = path_graph(7);
        for layout in Layout::ALL {
            let positions = compute(&graph, layout);
            assert_eq!(positions.len(), 7, "{layout:?}");
            assert_in_unit_box(&positions);
        }
    }

    #[test]
    fn layouts_are_deterministic() {
        let graph = path_graph(5);
        for layout in Layout::ALL {
            assert_eq!(compute(&graph, layout), compute(&graph, layout), "{layout:?}");
        }
    }

    #[test]
    fn single_node_sits_at_origin() {
        let graph = path_graph(1);
        for layout in Layout::ALL {
            assert_eq!(compute(&graph, layout), vec![(0.0, 0.0)], "{layout:?}");
        }
    }

    #[test]
    fn spring_separates_connected_nodes() {
        let positions = compute(&path_graph(2), Layout::Spring);
        let (a, b) = (positions[0], positions[1]);
        assert!((a.0 - b.0).hypot(a.1 - b.1) > 0.5);
    }

    #[test]
    fn shell_puts_hub_in_the_center() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let hub = graph.add_node(());
        for _ in 0..4 {
            let leaf = graph.add_node(());
            graph.add_edge(hub, leaf, ());
        }
        let positions = compute(&graph, Layout::Shell);
        assert!(positions[0].0.hypot(positions[0].1) < 1e-9);
        for &(x, y) in &positions[1..] {
            assert!((x.hypot(y) - 1.0).abs() < 1e-9, "leaf at ({x}, {y})");
        }
    }

    #[test]
    fn jacobi_recovers_path_laplacian_spectrum() {
        // Eigenvalues of the 3-node path Laplacian are 0, 1 and 3.
        let laplacian = vec![
            vec![1.0, -1.0, 0.0],
            vec![-1.0, 2.0, -1.0],
            vec![0.0, -1.0, 1.0],
        ];
        let (mut values, _) = jacobi_eigen(laplacian);
        values.sort_by(f64::total_cmp);
        for (got, want) in values.iter().zip([0.0, 1.0, 3.0]) {
            assert!((got - want).abs() < 1e-9, "got {values:?}");
        }
    }
}
