use criterion::{Criterion, criterion_group, criterion_main};
use skeletree::edit::SubsetOptions;
use skeletree::graph::{GeodesicOptions, StrahlerMethod};
use skeletree::polarity::{FlowMode, SplitOptions};
use skeletree::{Connector, HealOptions, Node, Skeleton};
use std::hint::black_box;

const REGRESSION_SIZES: &[(&str, usize)] = &[("n1k", 1_000), ("n10k", 10_000)];

const REPORTING_SIZES: &[(&str, usize)] = &[("n100k", 100_000)];

/// Random walk tree with a branch every few nodes and synapses on most leaves.
///
/// Deterministic (fixed linear congruential sequence) so runs are comparable.
fn synthetic_neuron(num_nodes: usize) -> Skeleton {
    let mut state: u64 = 0x5eed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let mut nodes: Vec<Node> = Vec::with_capacity(num_nodes);
    nodes.push(Node::new(1, None, [0.0; 3], Some(1.0)));
    for i in 1..num_nodes {
        // Mostly extend the previous node, sometimes branch off an earlier one
        let parent_row = if next() % 8 == 0 { next() % i } else { i - 1 };
        let [x, y, z] = *nodes[parent_row].position();
        let step = |r: usize| (r % 200) as f64 / 100.0 - 1.0;
        let position = [x + step(next()), y + step(next()), z + step(next())];
        nodes.push(Node::new(i as i64 + 1, Some(parent_row as i64 + 1), position, None));
    }
    let skeleton = Skeleton::from_nodes(nodes).unwrap();

    let connectors = skeleton
        .leafs()
        .into_iter()
        .enumerate()
        .map(|(i, leaf)| {
            let position = *skeleton.node(leaf).unwrap().position();
            let kind = if position[0] > 0.0 { "pre" } else { "post" };
            Connector::new(i as i64 + 1, leaf, position, kind)
        })
        .collect();
    skeleton.with_connectors(connectors).unwrap()
}

/// Drops every 50th node, leaving many fragments.
fn fragmented(skeleton: &Skeleton) -> Skeleton {
    let keep: Vec<i64> = skeleton
        .nodes()
        .iter()
        .map(Node::id)
        .filter(|id| id % 50 != 0)
        .collect();
    let mut fragments = skeleton.clone();
    fragments.subset(&keep, SubsetOptions::new()).unwrap();
    fragments
}

fn bench_skeleton(c: &mut Criterion, name: &str, skeleton: &Skeleton) {
    let sources: Vec<i64> = skeleton.leafs().into_iter().take(100).collect();
    c.bench_function(&format!("{name}/geodesic_matrix"), |b| {
        b.iter(|| {
            skeleton
                .geodesic_matrix(Some(black_box(sources.as_slice())), None, &GeodesicOptions::new())
                .unwrap()
        });
    });

    c.bench_function(&format!("{name}/strahler"), |b| {
        b.iter(|| black_box(skeleton).strahler_index(StrahlerMethod::Standard));
    });

    c.bench_function(&format!("{name}/flow_centrality"), |b| {
        b.iter(|| black_box(skeleton).flow_centrality(FlowMode::Sum).unwrap());
    });

    c.bench_function(&format!("{name}/split"), |b| {
        b.iter(|| {
            black_box(skeleton)
                .split_axon_dendrite(&SplitOptions::default())
                .unwrap()
        });
    });

    let fragments = fragmented(skeleton);
    c.bench_function(&format!("{name}/heal"), |b| {
        b.iter(|| {
            let mut healed = fragments.clone();
            healed.heal(&HealOptions::new()).unwrap();
            healed
        });
    });

    c.bench_function(&format!("{name}/reroot"), |b| {
        let target = sources[0];
        b.iter(|| {
            let mut rerooted = skeleton.clone();
            rerooted.reroot(black_box(target)).unwrap();
            rerooted
        });
    });
}

fn skeleton_regression(c: &mut Criterion) {
    for (name, size) in REGRESSION_SIZES {
        bench_skeleton(c, name, &synthetic_neuron(*size));
    }
}

fn skeleton_reporting(c: &mut Criterion) {
    for (name, size) in REPORTING_SIZES {
        bench_skeleton(c, name, &synthetic_neuron(*size));
    }
}

criterion_group!(regression, skeleton_regression);
criterion_group! {
    name = reporting;
    config = Criterion::default().sample_size(10);
    targets = skeleton_reporting
}
criterion_main!(regression, reporting);
