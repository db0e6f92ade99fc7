pub mod semantic_graph;
