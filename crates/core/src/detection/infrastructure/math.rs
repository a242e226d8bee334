//! Union-find helpers used to partition detection candidates.

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Partitions `0..n` into equivalence classes of `same`.
///
/// Returns one label per element. Labels are dense and numbered in order
/// of each class's first member, so output order follows input order.
pub fn partition<F>(n: usize, mut same: F) -> (Vec<usize>, usize)
where
    F: FnMut(usize, usize) -> bool,
{
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if same(i, j) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut root_label: Vec<Option<usize>> = vec![None; n];
    let mut labels = Vec::with_capacity(n);
    let mut classes = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        let label = *root_label[root].get_or_insert_with(|| {
            classes += 1;
            classes - 1
        });
        labels.push(label);
    }
    (labels, classes)
}
