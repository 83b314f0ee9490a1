use crate::model::skeleton::{Skeleton, StereoRef, Winding};
use crate::model::types::BondOrder;
use crate::model::valence;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Traversal policy that turns canonical atom ranks into one SMILES string.
///
/// Both policies rank atoms the same way; they differ in where each connected component
/// starts and how components are ordered, which is why the two toolkits produce different
/// (but individually deterministic) canonical strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonPolicy {
    /// Start at the lowest-ranked atom; order components by that rank.
    LowestRankFirst,
    /// Start at the highest-ranked atom of minimal degree; order components textually.
    TerminalHighestRankFirst,
}

/// Writes `skeleton` as canonical SMILES.
///
/// With `isomeric` set, isotopes and tetrahedral centres are written; otherwise both are
/// dropped and ignored by the ranking.
pub fn write(skeleton: &Skeleton, isomeric: bool, policy: CanonPolicy) -> String {
    let n = skeleton.atoms.len();
    if n == 0 {
        return String::new();
    }

    let mut adjacency = skeleton.adjacency();
    let ranks = canonical_ranks(skeleton, &adjacency, isomeric);
    for list in adjacency.iter_mut() {
        list.sort_by_key(|(nb, _)| ranks[*nb]);
    }

    let mut rendered: Vec<(usize, String)> = components(&adjacency)
        .into_iter()
        .map(|component| {
            let start = start_atom(&component, &adjacency, &ranks, policy);
            let traversal = Traversal::build(start, &adjacency);
            let mut emitter = Emitter {
                skeleton,
                traversal: &traversal,
                isomeric,
                emitted: vec![false; n],
                open_rings: HashMap::new(),
                digits_in_use: BTreeSet::new(),
                out: String::new(),
            };
            emitter.emit(start, None);
            (ranks[start], emitter.out)
        })
        .collect();

    match policy {
        CanonPolicy::LowestRankFirst => rendered.sort_by_key(|(rank, _)| *rank),
        CanonPolicy::TerminalHighestRankFirst => rendered.sort_by(|a, b| a.1.cmp(&b.1)),
    }

    rendered
        .into_iter()
        .map(|(_, s)| s)
        .collect::<Vec<_>>()
        .join(".")
}

fn canonical_ranks(
    skeleton: &Skeleton,
    adjacency: &[Vec<(usize, BondOrder)>],
    isomeric: bool,
) -> Vec<usize> {
    let n = skeleton.atoms.len();
    let invariants: Vec<(usize, u8, u16, i8, u8, bool)> = (0..n)
        .map(|i| {
            let atom = &skeleton.atoms[i];
            (
                adjacency[i].len(),
                atom.element.atomic_num(),
                if isomeric { atom.isotope } else { 0 },
                atom.formal_charge,
                skeleton.total_hydrogens(i),
                atom.aromatic,
            )
        })
        .collect();

    let mut ranks = dense_ranks(&invariants);
    loop {
        ranks = refine(ranks, adjacency);
        if distinct(&ranks) == n {
            return ranks;
        }
        let Some(tied) = lowest_tied_rank(&ranks) else {
            return ranks;
        };
        let chosen = ranks.iter().position(|&r| r == tied).unwrap_or(0);
        ranks = ranks
            .iter()
            .enumerate()
            .map(|(i, &r)| if i == chosen { 2 * r } else { 2 * r + 1 })
            .collect();
    }
}

fn refine(mut ranks: Vec<usize>, adjacency: &[Vec<(usize, BondOrder)>]) -> Vec<usize> {
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = adjacency
            .iter()
            .enumerate()
            .map(|(i, neighbors)| {
                let mut around: Vec<(usize, u8)> = neighbors
                    .iter()
                    .map(|(j, order)| (ranks[*j], order.molfile_code()))
                    .collect();
                around.sort_unstable();
                (ranks[i], around)
            })
            .collect();
        let refined = dense_ranks(&keys);
        if distinct(&refined) == distinct(&ranks) {
            return refined;
        }
        ranks = refined;
    }
}

fn dense_ranks<T: Ord>(values: &[T]) -> Vec<usize> {
    let mut sorted: Vec<&T> = values.iter().collect();
    sorted.sort();
    sorted.dedup();
    values
        .iter()
        .map(|v| sorted.binary_search(&v).unwrap_or(0))
        .collect()
}

fn distinct(ranks: &[usize]) -> usize {
    ranks.iter().collect::<HashSet<_>>().len()
}

fn lowest_tied_rank(ranks: &[usize]) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for &r in ranks {
        *counts.entry(r).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(r, _)| r)
        .min()
}

fn components(adjacency: &[Vec<(usize, BondOrder)>]) -> Vec<Vec<usize>> {
    let mut seen = vec![false; adjacency.len()];
    let mut result = Vec::new();
    for root in 0..adjacency.len() {
        if seen[root] {
            continue;
        }
        seen[root] = true;
        let mut stack = vec![root];
        let mut members = Vec::new();
        while let Some(u) = stack.pop() {
            members.push(u);
            for &(v, _) in &adjacency[u] {
                if !seen[v] {
                    seen[v] = true;
                    stack.push(v);
                }
            }
        }
        result.push(members);
    }
    result
}

fn start_atom(
    component: &[usize],
    adjacency: &[Vec<(usize, BondOrder)>],
    ranks: &[usize],
    policy: CanonPolicy,
) -> usize {
    let fallback = component.first().copied().unwrap_or(0);
    match policy {
        CanonPolicy::LowestRankFirst => component
            .iter()
            .copied()
            .min_by_key(|&i| ranks[i])
            .unwrap_or(fallback),
        CanonPolicy::TerminalHighestRankFirst => {
            let min_degree = component
                .iter()
                .map(|&i| adjacency[i].len())
                .min()
                .unwrap_or(0);
            component
                .iter()
                .copied()
                .filter(|&i| adjacency[i].len() == min_degree)
                .max_by_key(|&i| ranks[i])
                .unwrap_or(fallback)
        }
    }
}

/// Depth-first spanning tree plus the ring-closure bonds it leaves out.
struct Traversal {
    children: Vec<Vec<usize>>,
    ring_partners: Vec<Vec<usize>>,
    orders: HashMap<(usize, usize), BondOrder>,
}

impl Traversal {
    fn build(start: usize, adjacency: &[Vec<(usize, BondOrder)>]) -> Self {
        let n = adjacency.len();
        let mut children = vec![Vec::new(); n];
        let mut ring_partners = vec![Vec::new(); n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut ring_seen = HashSet::new();
        let mut orders = HashMap::new();

        visited[start] = true;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let (u, next) = *top;
            if next >= adjacency[u].len() {
                stack.pop();
                continue;
            }
            top.1 += 1;
            let (v, order) = adjacency[u][next];
            orders.insert(edge_key(u, v), order);
            if parent[u] == Some(v) {
                continue;
            }
            if !visited[v] {
                visited[v] = true;
                parent[v] = Some(u);
                children[u].push(v);
                stack.push((v, 0));
            } else if ring_seen.insert(edge_key(u, v)) {
                ring_partners[u].push(v);
                ring_partners[v].push(u);
            }
        }

        Self {
            children,
            ring_partners,
            orders,
        }
    }

    fn order(&self, a: usize, b: usize) -> BondOrder {
        self.orders
            .get(&edge_key(a, b))
            .copied()
            .unwrap_or(BondOrder::Single)
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

struct Emitter<'a> {
    skeleton: &'a Skeleton,
    traversal: &'a Traversal,
    isomeric: bool,
    emitted: Vec<bool>,
    open_rings: HashMap<(usize, usize), u32>,
    digits_in_use: BTreeSet<u32>,
    out: String,
}

impl<'a> Emitter<'a> {
    fn emit(&mut self, u: usize, parent: Option<usize>) {
        let traversal = self.traversal;
        self.emitted[u] = true;

        let mut ring_text = String::new();
        let mut ring_order = Vec::new();

        let mut closings: Vec<(u32, usize)> = traversal.ring_partners[u]
            .iter()
            .filter(|&&p| self.emitted[p])
            .filter_map(|&p| self.open_rings.get(&edge_key(u, p)).map(|d| (*d, p)))
            .collect();
        closings.sort_unstable();
        for (digit, partner) in closings {
            self.open_rings.remove(&edge_key(u, partner));
            self.digits_in_use.remove(&digit);
            ring_text.push_str(&digit_text(digit));
            ring_order.push(partner);
        }

        for &partner in &traversal.ring_partners[u] {
            if self.emitted[partner] {
                continue;
            }
            let digit = self.allocate_digit();
            self.open_rings.insert(edge_key(u, partner), digit);
            ring_text.push_str(self.bond_symbol(u, partner, traversal.order(u, partner)));
            ring_text.push_str(&digit_text(digit));
            ring_order.push(partner);
        }

        let chirality = if self.isomeric {
            self.skeleton.stereo_of(u).and_then(|centre| {
                let mut order: Vec<StereoRef> = parent.map(StereoRef::Atom).into_iter().collect();
                if centre.refs.contains(&StereoRef::ImplicitH) {
                    order.push(StereoRef::ImplicitH);
                }
                order.extend(ring_order.iter().map(|&p| StereoRef::Atom(p)));
                order.extend(traversal.children[u].iter().map(|&c| StereoRef::Atom(c)));
                centre.winding_for(&order)
            })
        } else {
            None
        };

        let token = self.atom_token(u, chirality);
        self.out.push_str(&token);
        self.out.push_str(&ring_text);

        let children = &traversal.children[u];
        for (k, &child) in children.iter().enumerate() {
            let last = k + 1 == children.len();
            if !last {
                self.out.push('(');
            }
            let symbol = self.bond_symbol(u, child, traversal.order(u, child));
            self.out.push_str(symbol);
            self.emit(child, Some(u));
            if !last {
                self.out.push(')');
            }
        }
    }

    fn allocate_digit(&mut self) -> u32 {
        let digit = (1..)
            .find(|d| !self.digits_in_use.contains(d))
            .unwrap_or(1);
        self.digits_in_use.insert(digit);
        digit
    }

    fn bond_symbol(&self, a: usize, b: usize, order: BondOrder) -> &'static str {
        let both_aromatic = self.skeleton.atoms[a].aromatic && self.skeleton.atoms[b].aromatic;
        match order {
            BondOrder::Single if both_aromatic => "-",
            BondOrder::Single => "",
            BondOrder::Double => "=",
            BondOrder::Triple => "#",
            BondOrder::Aromatic if both_aromatic => "",
            BondOrder::Aromatic => ":",
        }
    }

    fn atom_token(&self, idx: usize, chirality: Option<Winding>) -> String {
        let atom = &self.skeleton.atoms[idx];
        let isotope = if self.isomeric { atom.isotope } else { 0 };
        let hydrogens = self.skeleton.implicit_hydrogens(idx);
        let symbol = if atom.aromatic {
            atom.element.symbol().to_ascii_lowercase()
        } else {
            atom.element.symbol().to_string()
        };

        let bare = valence::is_organic_subset(atom.element, atom.aromatic)
            && atom.formal_charge == 0
            && isotope == 0
            && chirality.is_none()
            && hydrogens == self.skeleton.default_hydrogens(idx);
        if bare {
            return symbol;
        }

        let mut token = String::from("[");
        if isotope > 0 {
            token.push_str(&isotope.to_string());
        }
        token.push_str(&symbol);
        if let Some(winding) = chirality {
            token.push_str(winding.smiles_marker());
        }
        match hydrogens {
            0 => {}
            1 => token.push('H'),
            n => token.push_str(&format!("H{n}")),
        }
        match atom.formal_charge {
            0 => {}
            1 => token.push('+'),
            -1 => token.push('-'),
            c if c > 0 => token.push_str(&format!("+{c}")),
            c => token.push_str(&format!("-{}", -(c as i16))),
        }
        token.push(']');
        token
    }
}

fn digit_text(digit: u32) -> String {
    if digit < 10 {
        digit.to_string()
    } else {
        format!("%{digit:02}")
    }
}
