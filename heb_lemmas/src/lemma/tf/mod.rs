mod tensorflow_wrapper;
pub use self::tensorflow_wrapper::TensorflowScorer;
