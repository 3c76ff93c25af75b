//! The `OutputWriter` trait and the export driver.

use log::info;

use ps_ingest::SnappedPole;
use ps_spatial::RoadNetwork;

use crate::{EdgeRow, NodeRow, OutputError, OutputResult, PoleRow};

/// A sink for the three export layers.
///
/// Each `write_*` call replaces that layer's previous output; layers are
/// independent and a failure in one leaves the others as they were.
pub trait OutputWriter {
    fn write_nodes(&mut self, rows: &[NodeRow]) -> OutputResult<()>;

    fn write_edges(&mut self, rows: &[EdgeRow]) -> OutputResult<()>;

    fn write_poles(&mut self, rows: &[PoleRow]) -> OutputResult<()>;

    /// Flush anything buffered.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Write the network and the snapped poles through `writer`.
///
/// # Errors
///
/// [`OutputError::NotGeographic`] if `net` has not been reprojected to
/// WGS84; otherwise whatever the writer reports.
pub fn export<W: OutputWriter + ?Sized>(
    writer: &mut W,
    net: &RoadNetwork,
    poles: &[SnappedPole],
) -> OutputResult<()> {
    if !net.crs.is_geographic() {
        return Err(OutputError::NotGeographic(net.crs));
    }

    let nodes = NodeRow::from_network(net);
    let edges = EdgeRow::from_network(net);
    let poles: Vec<PoleRow> = poles.iter().map(PoleRow::from).collect();

    writer.write_nodes(&nodes)?;
    writer.write_edges(&edges)?;
    writer.write_poles(&poles)?;
    writer.finish()?;

    info!("exported {} nodes, {} edges, {} poles", nodes.len(), edges.len(), poles.len());
    Ok(())
}
