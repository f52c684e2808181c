//! The region server metrics shown by default.
//!
//! Paths follow the layout of the `/metrics?format=json` servlet: the `rpc`
//! and `hbase` contexts each hold a list of records, and every record is a
//! `[tags, metrics]` pair.

use super::metric::{integer, FieldPath, MetricDefinition};
use super::registry::{MetricRegistry, RegistryError};

const RPC: &str = "rpc.metrics.0";
const REGIONSERVER: &str = "hbase.regionserver.0";

/// Build the default HBase registry, in display order.
pub fn hbase_registry() -> Result<MetricRegistry, RegistryError> {
    let mut registry = MetricRegistry::new();

    registry.register_gauge("HOSTNAME", &format!("{RPC}.0.hostName"))?;
    registry.register_delta("RPC_MULTIS", &format!("{RPC}.1.multi_num_ops"))?;

    let requests: FieldPath = format!("{REGIONSERVER}.1.requests").parse()?;
    registry.register(MetricDefinition::gauge("REQS/S", requests).with_formatter(integer))?;

    registry.register_gauge("MEMSTORE", &format!("{REGIONSERVER}.1.memstoreSizeMB"))?;
    registry.register_gauge("FLU_SIZE", &format!("{REGIONSERVER}.1.flushSize_avg_time"))?;
    registry.register_gauge("RGNS", &format!("{REGIONSERVER}.1.regions"))?;
    registry.register_gauge("STR_FILES", &format!("{REGIONSERVER}.1.storefiles"))?;
    registry.register_gauge("CMPCT_Q_SZ", &format!("{REGIONSERVER}.1.compactionQueueSize"))?;

    Ok(registry)
}
