use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use protobuf::{CodedOutputStream, ProtobufResult};
use tensorflow::{
    Graph, ImportGraphDefOptions, Operation, Session, SessionOptions, SessionRunArgs, Tensor,
};

use crate::lemma::{Batch, ScoreMatrix, Scorer};
use crate::{Error, Ops, Result};

/// Holds the Tensorflow session and the ops of the scoring graph.
struct TensorflowWrapper {
    session: Session,
    input_ids_op: Operation,
    attention_mask_op: Operation,
    token_type_ids_op: Operation,
    output_op: Operation,
}

/// Scores batches with a frozen Tensorflow graph.
///
/// Steps through the session are serialized.
pub struct TensorflowScorer {
    wrapper: Mutex<TensorflowWrapper>,
}

impl TensorflowScorer {
    /// Construct a new TensorflowScorer.
    ///
    /// * `model_path` is the location of the frozen graph in binary protobuf format.
    /// * `ops` holds the op names in the graph.
    /// * `intra_op_threads` defines the amount of intra operation threads in Tensorflow.
    /// * `inter_op_threads` defines the amount of inter operation threads in Tensorflow.
    pub fn load(
        model_path: &Path,
        ops: &Ops,
        intra_op_threads: usize,
        inter_op_threads: usize,
    ) -> Result<Self> {
        let resource_err = |reason: String| Error::Resource {
            path: model_path.to_owned(),
            reason,
        };

        let mut proto = Vec::new();
        File::open(model_path)?.read_to_end(&mut proto)?;

        let mut graph = Graph::new();
        graph
            .import_graph_def(&proto, &ImportGraphDefOptions::new())
            .map_err(|err| resource_err(err.to_string()))?;

        let mut config = ConfigProto::new();
        config.set_intra_op_parallelism_threads(intra_op_threads as i32);
        config.set_inter_op_parallelism_threads(inter_op_threads as i32);
        let config = config
            .write_to_bytes()
            .map_err(|err| resource_err(err.to_string()))?;
        let mut options = SessionOptions::new();
        options
            .set_config(&config)
            .map_err(|err| resource_err(err.to_string()))?;
        let session =
            Session::new(&options, &graph).map_err(|err| resource_err(err.to_string()))?;

        let op = |name: &str| {
            graph
                .operation_by_name_required(name)
                .map_err(|err| resource_err(format!("op {}: {}", name, err)))
        };
        let wrapper = TensorflowWrapper {
            input_ids_op: op(&ops.input_ids)?,
            attention_mask_op: op(&ops.attention_mask)?,
            token_type_ids_op: op(&ops.token_type_ids)?,
            output_op: op(&ops.output)?,
            session,
        };

        Ok(TensorflowScorer {
            wrapper: Mutex::new(wrapper),
        })
    }
}

/// The thread pool part of `tensorflow.ConfigProto`. 0 keeps the Tensorflow
/// default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ConfigProto {
    intra_op_parallelism_threads: i32,
    inter_op_parallelism_threads: i32,
}

impl ConfigProto {
    fn new() -> Self {
        Self::default()
    }

    fn set_intra_op_parallelism_threads(&mut self, threads: i32) {
        self.intra_op_parallelism_threads = threads;
    }

    fn set_inter_op_parallelism_threads(&mut self, threads: i32) {
        self.inter_op_parallelism_threads = threads;
    }

    /// Wire encoding; zero fields are omitted as proto3 does.
    fn write_to_bytes(&self) -> ProtobufResult<Vec<u8>> {
        let fields = [
            (2, self.intra_op_parallelism_threads),
            (5, self.inter_op_parallelism_threads),
        ];

        let mut bytes = Vec::new();
        {
            let mut os = CodedOutputStream::vec(&mut bytes);
            for (number, value) in fields {
                if value != 0 {
                    os.write_int32(number, value)?;
                }
            }
            os.flush()?;
        }
        Ok(bytes)
    }
}

fn input(values: &[i64]) -> Result<Tensor<i64>> {
    Tensor::new(&[1, values.len() as u64])
        .with_values(values)
        .map_err(Error::inference)
}

impl Scorer for TensorflowScorer {
    fn run(&self, batch: &Batch) -> Result<ScoreMatrix> {
        let input_ids = input(batch.input_ids())?;
        let attention_mask = input(batch.attention_mask())?;
        let token_type_ids = input(batch.token_type_ids())?;

        let mut guard = self.wrapper.lock().unwrap_or_else(PoisonError::into_inner);
        let wrapper = &mut *guard;

        let mut step = SessionRunArgs::new();
        step.add_feed(&wrapper.input_ids_op, 0, &input_ids);
        step.add_feed(&wrapper.attention_mask_op, 0, &attention_mask);
        step.add_feed(&wrapper.token_type_ids_op, 0, &token_type_ids);
        let logits_token = step.request_fetch(&wrapper.output_op, 0);

        wrapper.session.run(&mut step).map_err(Error::inference)?;
        let logits: Tensor<f32> = step.fetch(logits_token).map_err(Error::inference)?;

        let dims = logits.dims();
        if dims.len() != 3 || dims[0] == 0 {
            return Err(Error::inference(format!(
                "expected logits of shape [1, seq, vocab], got {:?}",
                dims
            )));
        }
        let (rows, width) = (dims[1] as usize, dims[2] as usize);
        ScoreMatrix::new(logits[..rows * width].to_vec(), width)
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigProto;

    #[test]
    fn encodes_thread_config() {
        let mut config = ConfigProto::new();
        config.set_intra_op_parallelism_threads(2);
        config.set_inter_op_parallelism_threads(1);
        assert_eq!(config.write_to_bytes().unwrap(), vec![0x10, 2, 0x28, 1]);
    }

    #[test]
    fn default_config_is_empty() {
        assert!(ConfigProto::new().write_to_bytes().unwrap().is_empty());

        let mut config = ConfigProto::new();
        config.set_inter_op_parallelism_threads(3);
        assert_eq!(config.write_to_bytes().unwrap(), vec![0x28, 3]);
    }
}
