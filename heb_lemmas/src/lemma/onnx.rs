use std::path::Path;

use tract_onnx::prelude::*;

use super::{Batch, ScoreMatrix, Scorer};
use crate::{Error, Ops, Result};

/// Runs an ONNX masked-language model with tract.
///
/// The optimized plan is immutable, so concurrent calls run in parallel.
pub struct OnnxScorer {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxScorer {
    /// Loads the model at `path`, feeding the inputs named in `ops`.
    pub fn load(path: &Path, ops: &Ops) -> Result<Self> {
        let inputs = [&ops.input_ids, &ops.attention_mask, &ops.token_type_ids];
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_names(inputs))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|err| Error::Resource {
                path: path.to_owned(),
                reason: format!("{:#}", err),
            })?;
        Ok(OnnxScorer { plan })
    }
}

fn input(values: &[i64]) -> Result<TValue> {
    Tensor::from_shape(&[1, values.len()], values)
        .map(TValue::from)
        .map_err(Error::inference)
}

impl Scorer for OnnxScorer {
    fn run(&self, batch: &Batch) -> Result<ScoreMatrix> {
        let inputs = tvec!(
            input(batch.input_ids())?,
            input(batch.attention_mask())?,
            input(batch.token_type_ids())?
        );
        let outputs = self.plan.run(inputs).map_err(Error::inference)?;

        let logits = outputs
            .first()
            .ok_or_else(|| Error::inference("model produced no output"))?
            .to_array_view::<f32>()
            .map_err(Error::inference)?;
        let shape = logits.shape();
        if shape.len() != 3 || shape[0] == 0 {
            return Err(Error::inference(format!(
                "expected logits of shape [1, seq, vocab], got {:?}",
                shape
            )));
        }

        // first (and only) sequence of the batch
        let (rows, width) = (shape[1], shape[2]);
        let data = logits.iter().take(rows * width).copied().collect();
        ScoreMatrix::new(data, width)
    }
}
