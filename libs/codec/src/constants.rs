//! Wire field names for the flat JSON envelope encoding.
//!
//! First-class fields are written with all-lowercase names and no
//! separators, matching how producers in other ecosystems lower-case their
//! property names. The parser lower-cases incoming keys before matching
//! against these constants; any key that matches none of them lands in the
//! envelope's extension bag.

pub const ID: &str = "id";
pub const SOURCE: &str = "source";
pub const TYPE: &str = "type";
pub const SPEC_VERSION: &str = "specversion";

pub const TIME: &str = "time";
pub const SCHEMA_URL: &str = "schemaurl";
pub const CONTENT_TYPE: &str = "contenttype";
pub const DATA: &str = "data";
pub const SUBJECT: &str = "subject";

pub const CORRELATION_ID: &str = "correlationid";
pub const CREATED_FROM: &str = "createdfrom";
pub const ROUTE: &str = "route";
pub const ROUTING_SLIP: &str = "routingslip";
pub const IS_TEST_MESSAGE: &str = "istestmessage";
pub const FILTER_OUT_BEFORE_TOPIC: &str = "filteroutbeforetopic";
pub const IS_ERROR_MESSAGE: &str = "iserrormessage";
pub const ERROR_MESSAGE: &str = "errormessage";
pub const ERROR_TRACE: &str = "errortrace";
pub const EXPIRY_DATE: &str = "expirydate";
pub const SEQUENCE_ID: &str = "sequenceid";
pub const SEQUENCE_NUMBER: &str = "sequencenumber";
pub const SEQUENCE_SIZE: &str = "sequencesize";
pub const RETURN_TOPIC: &str = "returntopic";
pub const DATA_REF: &str = "dataref";

// Route history hop fields
pub const HOP_TYPE: &str = "type";
pub const HOP_ID: &str = "id";
pub const HOP_TIMESTAMP: &str = "timestamp";
