//! Boosted Haar cascade model in OpenCV's XML layout.
//!
//! Only the layout written by `opencv_traincascade` (a `<cascade>` element
//! with `BOOST` stages over upright `HAAR` features) is understood. That
//! covers the stock `haarcascade_frontalface_default.xml`.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;
use thiserror::Error;

use crate::detection::infrastructure::integral_image::IntegralImage;

/// Subtracted from every stage threshold read from XML, matching the
/// margin the cascades were trained against.
const STAGE_THRESHOLD_EPS: f64 = 1e-5;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to read cascade {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cascade is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("legacy (pre-traincascade) cascade layout is not supported")]
    LegacyFormat,
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
    #[error("malformed cascade: {0}")]
    Malformed(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f64,
}

/// A Haar-like feature: weighted sum of rectangle sums inside the window.
#[derive(Clone, Debug, PartialEq)]
pub struct HaarFeature {
    rects: Vec<WeightedRect>,
}

impl HaarFeature {
    pub fn new(rects: Vec<WeightedRect>) -> Self {
        Self { rects }
    }

    fn value(&self, ii: &IntegralImage, x: u32, y: u32) -> f64 {
        self.rects
            .iter()
            .map(|r| r.weight * ii.rect_sum(x + r.x, y + r.y, r.width, r.height) as f64)
            .sum()
    }
}

/// Internal decision node. Child references `> 0` index another node of
/// the same tree; references `<= 0` select leaf `-child`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeNode {
    pub feature: usize,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeakTree {
    nodes: Vec<TreeNode>,
    leaves: Vec<f64>,
}

impl WeakTree {
    pub fn new(nodes: Vec<TreeNode>, leaves: Vec<f64>) -> Self {
        Self { nodes, leaves }
    }

    /// Single-split tree: `below` when the feature is under `threshold`.
    pub fn stump(feature: usize, threshold: f64, below: f64, above: f64) -> Self {
        Self::new(
            vec![TreeNode {
                feature,
                threshold,
                left: 0,
                right: -1,
            }],
            vec![below, above],
        )
    }

    fn evaluate<F: Fn(usize) -> f64>(&self, feature_value: F) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            let next = if feature_value(node.feature) < node.threshold {
                node.left
            } else {
                node.right
            };
            if next <= 0 {
                return self.leaves[next.unsigned_abs() as usize];
            }
            idx = next as usize;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    threshold: f64,
    trees: Vec<WeakTree>,
}

impl Stage {
    pub fn new(threshold: f64, trees: Vec<WeakTree>) -> Self {
        Self { threshold, trees }
    }
}

/// Immutable, validated cascade ready for evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct HaarCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

impl HaarCascade {
    pub fn new(
        window_width: u32,
        window_height: u32,
        stages: Vec<Stage>,
        features: Vec<HaarFeature>,
    ) -> Result<Self, CascadeError> {
        if window_width < 3 || window_height < 3 {
            return Err(CascadeError::Malformed(format!(
                "window {window_width}x{window_height} is smaller than 3x3"
            )));
        }
        if stages.is_empty() {
            return Err(CascadeError::Malformed("cascade has no stages".into()));
        }
        for (fi, feature) in features.iter().enumerate() {
            if feature.rects.is_empty() {
                return Err(CascadeError::Malformed(format!("feature {fi} has no rectangles")));
            }
            for r in &feature.rects {
                if r.x + r.width > window_width || r.y + r.height > window_height {
                    return Err(CascadeError::Malformed(format!(
                        "feature {fi} rectangle ({}, {}, {}, {}) leaves the window",
                        r.x, r.y, r.width, r.height
                    )));
                }
            }
        }
        for (si, stage) in stages.iter().enumerate() {
            if stage.trees.is_empty() {
                return Err(CascadeError::Malformed(format!("stage {si} has no classifiers")));
            }
            for tree in &stage.trees {
                validate_tree(tree, features.len())
                    .map_err(|msg| CascadeError::Malformed(format!("stage {si}: {msg}")))?;
            }
        }

        Ok(Self {
            window_width,
            window_height,
            stages,
            features,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, CascadeError> {
        let xml = fs::read_to_string(path).map_err(|source| CascadeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml_str(&xml)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self, CascadeError> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        let Some(cascade) = root.children().find(|n| n.has_tag_name("cascade")) else {
            let legacy = root
                .children()
                .any(|n| n.attribute("type_id") == Some("opencv-haar-classifier"));
            return Err(if legacy {
                CascadeError::LegacyFormat
            } else {
                CascadeError::Malformed("missing <cascade> element".into())
            });
        };

        let stage_type = text(child(cascade, "stageType")?);
        if stage_type != "BOOST" {
            return Err(CascadeError::Unsupported(format!("stage type {stage_type}")));
        }
        let feature_type = text(child(cascade, "featureType")?);
        if feature_type != "HAAR" {
            return Err(CascadeError::Unsupported(format!("feature type {feature_type}")));
        }

        let window_width = parse_u32(child(cascade, "width")?)?;
        let window_height = parse_u32(child(cascade, "height")?)?;

        let stages = items(child(cascade, "stages")?)
            .map(parse_stage)
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(declared) = cascade.children().find(|n| n.has_tag_name("stageNum")) {
            let declared = parse_u32(declared)? as usize;
            if declared != stages.len() {
                return Err(CascadeError::Malformed(format!(
                    "stageNum is {declared} but {} stages are present",
                    stages.len()
                )));
            }
        }

        let features = items(child(cascade, "features")?)
            .map(parse_feature)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(window_width, window_height, stages, features)
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs every stage on the model-sized window at `(x, y)`.
    ///
    /// Feature responses are divided by `area * stddev` of the window's
    /// inner rectangle, so the decision is invariant to brightness and
    /// contrast. Flat windows use a divisor of 1.
    pub fn evaluate(&self, ii: &IntegralImage, x: u32, y: u32) -> bool {
        let (nw, nh) = (self.window_width - 2, self.window_height - 2);
        let area = (nw * nh) as f64;
        let sum = ii.rect_sum(x + 1, y + 1, nw, nh) as f64;
        let sq_sum = ii.rect_sq_sum(x + 1, y + 1, nw, nh);
        let nf = area * sq_sum - sum * sum;
        let inv_norm = if nf > 0.0 { 1.0 / nf.sqrt() } else { 1.0 };

        self.stages.iter().all(|stage| {
            let score: f64 = stage
                .trees
                .iter()
                .map(|tree| tree.evaluate(|f| self.features[f].value(ii, x, y) * inv_norm))
                .sum();
            score >= stage.threshold
        })
    }
}

fn validate_tree(tree: &WeakTree, feature_count: usize) -> Result<(), String> {
    if tree.nodes.is_empty() || tree.leaves.is_empty() {
        return Err("weak classifier without nodes or leaves".into());
    }
    for (ni, node) in tree.nodes.iter().enumerate() {
        if node.feature >= feature_count {
            return Err(format!(
                "node references feature {} of {feature_count}",
                node.feature
            ));
        }
        for child in [node.left, node.right] {
            let ok = if child <= 0 {
                (child.unsigned_abs() as usize) < tree.leaves.len()
            } else {
                (child as usize) > ni && (child as usize) < tree.nodes.len()
            };
            if !ok {
                return Err(format!("node {ni} has invalid child reference {child}"));
            }
        }
    }
    Ok(())
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Result<Node<'a, 'i>, CascadeError> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .ok_or_else(|| CascadeError::Malformed(format!("missing <{name}> element")))
}

/// List entries, which OpenCV writes as `<_>` elements.
fn items<'a, 'i>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(|n| n.is_element())
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

fn parse_u32(node: Node<'_, '_>) -> Result<u32, CascadeError> {
    let raw = text(node);
    raw.parse().map_err(|_| {
        CascadeError::Malformed(format!(
            "<{}> is not an unsigned integer: {raw:?}",
            node.tag_name().name()
        ))
    })
}

fn parse_numbers(node: Node<'_, '_>) -> Result<Vec<f64>, CascadeError> {
    text(node)
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                CascadeError::Malformed(format!(
                    "<{}> contains a non-numeric value {tok:?}",
                    node.tag_name().name()
                ))
            })
        })
        .collect()
}

fn parse_stage(node: Node<'_, '_>) -> Result<Stage, CascadeError> {
    let threshold = parse_numbers(child(node, "stageThreshold")?)?
        .first()
        .copied()
        .ok_or_else(|| CascadeError::Malformed("empty <stageThreshold>".into()))?;
    let trees = items(child(node, "weakClassifiers")?)
        .map(parse_tree)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage::new(threshold - STAGE_THRESHOLD_EPS, trees))
}

fn parse_tree(node: Node<'_, '_>) -> Result<WeakTree, CascadeError> {
    let raw_nodes = parse_numbers(child(node, "internalNodes")?)?;
    if raw_nodes.is_empty() || raw_nodes.len() % 4 != 0 {
        return Err(CascadeError::Malformed(format!(
            "<internalNodes> must hold groups of 4 values, found {}",
            raw_nodes.len()
        )));
    }
    let nodes = raw_nodes
        .chunks_exact(4)
        .map(|c| TreeNode {
            left: c[0] as i32,
            right: c[1] as i32,
            feature: c[2].max(0.0) as usize,
            threshold: c[3],
        })
        .collect();
    let leaves = parse_numbers(child(node, "leafValues")?)?;
    Ok(WeakTree::new(nodes, leaves))
}

fn parse_feature(node: Node<'_, '_>) -> Result<HaarFeature, CascadeError> {
    if let Some(tilted) = node.children().find(|n| n.has_tag_name("tilted")) {
        if text(tilted) != "0" {
            return Err(CascadeError::Unsupported("tilted Haar features".into()));
        }
    }
    let rects = items(child(node, "rects")?)
        .map(|r| {
            let v = parse_numbers(r)?;
            if v.len() != 5 || v[..4].iter().any(|&c| c < 0.0) {
                return Err(CascadeError::Malformed(format!(
                    "rectangle needs x y w h weight, got {v:?}"
                )));
            }
            Ok(WeightedRect {
                x: v[0] as u32,
                y: v[1] as u32,
                width: v[2] as u32,
                height: v[3] as u32,
                weight: v[4],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(HaarFeature::new(rects))
}
