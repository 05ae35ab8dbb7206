/*
* Command Processor
    Input Pattern
        [LETTER]\r\n
        [PAYLOAD LINE]\r\n ...
    Output Pattern
        OK | ERR [CODE] | [VALUES]\r\n
*/

/* --------------------------- Library -------------------------- */
use embedded_io_async::Read;
use embedded_io_async::Write;

use crate::interface::AngleSensor;
use crate::resources::ErrorCode;
use crate::resources::Mode;
use crate::resources::RunEvent;
use crate::resources::Sample;
use crate::resources::ServoHandler;
use crate::resources::Trajectory;
use crate::resources::CurrentGains;
use crate::resources::PositionGains;
use crate::resources::LINE_BUFFER_SIZE;
use crate::resources::REPLY_BUFFER_SIZE;
use crate::resources::TELEMETRY_CHUNK;

/* --------------------------- Declare Modules -------------------------- */
pub mod args;
pub mod line;
pub mod op_code;
pub mod processor;

pub use args::*;
pub use line::*;
pub use op_code::*;
pub use processor::*;
