pub mod delta;
pub mod extract;
pub mod features;
pub mod pipeline;
pub mod plot;
pub mod serialization;
pub mod stiffness;
pub mod table;

mod traits;

pub use delta::{DeltaOutcome, ZeroCheckReport, compute_delta, verify_zero};
pub use extract::{
    ExtractionModule, ExtractionOutcome, ExtractionReport, ExtractionRequest, ExtractionSummary,
    PlotRequest, extract_features,
};
pub use features::{ChannelFeatures, align_to_axis, detect_peaks};
pub use pipeline::{
    DeltaModule, DeltaRequest, PipelineReport, PipelineRequest, run_pipeline,
};
pub use plot::{all_nodes_plot_file, node_plot_file, plot_all_nodes, plot_node_response};
pub use serialization::{TableFormatError, load_table_csv, parse_table_csv, render_table_csv};
pub use stiffness::{BushStiffness, StiffnessDeck, parse_bush_source, render_bush_cards};
pub use table::{AssembledTable, TableAssembler};
pub use traits::ModuleExecutor;
