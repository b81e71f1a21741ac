//! Mean Intersection-over-Union for per-pixel class predictions.

use burn::tensor::{backend::Backend, Int, Tensor};

/// Mean IoU for a batch of logits `[B, C, H, W]` against class-index
/// targets `[B, H, W]`.
///
/// Logits are reduced to hard predictions by arg-max over the class
/// dimension. For each class in `[0, num_classes)` the intersection and
/// union pixel counts are taken across the whole batch; a class whose
/// union is zero (absent from both prediction and ground truth) is
/// excluded from the average rather than scored as zero. When every class
/// is excluded the batch scores 0.0 by convention.
///
/// The same function serves validation-time monitoring and final
/// evaluation, so scores are comparable across both contexts.
pub fn mean_iou<B: Backend>(
    logits: &Tensor<B, 4>,
    targets: &Tensor<B, 3, Int>,
    num_classes: usize,
) -> f32 {
    let [b, c, h, w] = logits.dims();
    let preds = match logits.to_data().convert::<f32>().to_vec::<f32>() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    let gt = match targets.to_data().convert::<i64>().to_vec::<i64>() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };

    let hw = h * w;
    let mut pred_cls = vec![0usize; b * hw];
    for bi in 0..b {
        for p in 0..hw {
            let mut best = f32::NEG_INFINITY;
            let mut best_c = 0usize;
            for ci in 0..c {
                let v = preds[bi * c * hw + ci * hw + p];
                if v > best {
                    best = v;
                    best_c = ci;
                }
            }
            pred_cls[bi * hw + p] = best_c;
        }
    }

    let mut ious = Vec::new();
    for cls in 0..num_classes {
        let mut intersection = 0u64;
        let mut union = 0u64;
        for (p, t) in pred_cls.iter().zip(gt.iter()) {
            let in_pred = *p == cls;
            let in_gt = *t == cls as i64;
            if in_pred && in_gt {
                intersection += 1;
            }
            if in_pred || in_gt {
                union += 1;
            }
        }
        if union == 0 {
            continue;
        }
        ious.push(intersection as f32 / union as f32);
    }

    if ious.is_empty() {
        return 0.0;
    }
    ious.iter().sum::<f32>() / ious.len() as f32
}
