// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Next-token selection from a logits row.

use rand::Rng;

/// Index of the largest logit. Ties resolve to the lowest index.
pub fn argmax(logits: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in logits.iter().enumerate() {
        if v > logits[best] {
            best = i;
        }
    }
    best
}

/// Softmax of `logits / temperature`.
pub fn softmax(logits: &[f32], temperature: f32) -> Vec<f32> {
    let t = temperature.max(1e-5);
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| ((l - max) / t).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Samples an index with temperature scaling and nucleus (top-p) filtering.
///
/// Keeps the smallest set of most probable tokens whose cumulative
/// probability reaches `top_p` (at least one token), renormalizes, and draws.
pub fn sample_top_p<R: Rng>(
    logits: &[f32],
    temperature: f32,
    top_p: f32,
    rng: &mut R,
) -> usize {
    let probs = softmax(logits, temperature);
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));

    let mut kept = Vec::new();
    let mut cumulative = 0.0f32;
    for &i in &order {
        kept.push(i);
        cumulative += probs[i];
        if cumulative >= top_p {
            break;
        }
    }

    let mut draw = rng.r#gen::<f32>() * cumulative;
    for &i in &kept {
        draw -= probs[i];
        if draw <= 0.0 {
            return i;
        }
    }
    kept.last().copied().unwrap_or(0)
}
