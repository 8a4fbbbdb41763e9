pub mod capacity_simulator;
pub mod defer_scorer;
pub mod genetic_optimizer;
pub mod harmony_searcher;
pub mod hold_decider;
pub mod input_model;
pub mod machine_pool;
pub mod order;
pub mod plan;
pub mod seed;
pub mod sequence_parser;
pub mod similarity_clusterer;
pub mod window_gate;
