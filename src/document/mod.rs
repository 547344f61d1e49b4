/*!
 * Document read/write collaborators.
 *
 * The pipeline only talks to the traits in `reader` and `writer`; `pdf`
 * provides the implementations over `lopdf`. Tests substitute in-memory
 * fakes.
 */

pub mod pdf;
pub mod reader;
pub mod writer;

pub use pdf::{PdfReader, PdfWriter};
pub use reader::{DocumentHandle, DocumentReader};
pub use writer::{DocumentBuilder, DocumentWriter, FontStyle};
