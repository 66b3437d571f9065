//! Temporal collections: one topology shared by many frames of field data.
//!
//! The topology is written once into a uniform grid named `mesh`. Every frame is a grid in
//! a temporal collection that includes the geometry and topology of `mesh` through an
//! xpointer, carries its `Time` and lists its own attributes:
//!
//! ```xml
//! <Grid Name="TimeSeries" GridType="Collection" CollectionType="Temporal">
//!   <Grid>
//!     <xi:include xpointer="xpointer(//Grid[@Name=&quot;mesh&quot;]/*[self::Topology or self::Geometry])"/>
//!     <Time Value="0.25"/>
//!     <Attribute Name="u" AttributeType="Scalar" Center="Node"> DataItem </Attribute>
//!   </Grid>
//! </Grid>
//! ```

use crate::codec::{self, TopologyLayout};
use crate::prelude::*;
use crate::read_xdmf;
use crate::tree;
use crate::utils;
use crate::write_xdmf::document_root;

/// name of the grid that holds the shared geometry and topology
pub const TOPOLOGY_GRID_NAME: &str = "mesh";

const COLLECTION_NAME: &str = "TimeSeries";

fn template_xpointer() -> String {
    format!(
        "xpointer(//Grid[@Name=\"{TOPOLOGY_GRID_NAME}\"]/*[self::Topology or self::Geometry])"
    )
}

/// Point and cell fields of one frame
pub type PointData = BTreeMap<String, DataArray>;
pub type CellData = BTreeMap<String, BTreeMap<CellType, DataArray>>;

/// Writes a time series document and its side-car.
///
/// The session moves from created, to topology written, to closed. Frames can only be
/// written after the topology and before the session is closed. The document is written
/// when the session is closed, either by [`close`](Self::close) or when it is dropped.
///
/// ```no_run
/// use std::collections::BTreeMap;
/// use xdmf::{ndarray::array, CellBlock, CellType, DataArray, Mesh, TimeSeriesWriter, WriteOptions};
///
/// let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
/// let mesh = Mesh::new(points, vec![CellBlock::new(CellType::Triangle, array![[0, 1, 2]])]);
///
/// let mut writer = TimeSeriesWriter::create("./series.xdmf", &WriteOptions::default()).unwrap();
/// writer.write_topology(&mesh).unwrap();
///
/// for step in 0..5 {
///     let mut point_data = BTreeMap::new();
///     point_data.insert("u".to_string(), DataArray::from(array![0.0, 1.0, step as f64]));
///     writer.write_frame(step as f64 * 0.1, &point_data, &BTreeMap::new()).unwrap();
/// }
///
/// writer.close().unwrap();
/// ```
pub struct TimeSeriesWriter {
    path: PathBuf,
    sink: ReferenceSink,
    domain: Element,
    collection: Element,
    topology: Option<Mesh>,
    frames: usize,
    closed: bool,
}

impl TimeSeriesWriter {
    /// open the side-car resources `options` asks for next to `path`
    pub fn create<P: AsRef<Path>>(path: P, options: &WriteOptions) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let sink = ReferenceSink::create(&path, options)?;

        tracing::debug!(
            path = %path.display(),
            data_format = ?options.data_format,
            "started time series"
        );

        let collection = Element::new("Grid")
            .with_attribute("Name", COLLECTION_NAME)
            .with_attribute("GridType", "Collection")
            .with_attribute("CollectionType", "Temporal");

        Ok(Self {
            path,
            sink,
            domain: Element::new("Domain"),
            collection,
            topology: None,
            frames: 0,
            closed: false,
        })
    }

    /// Write the points and cell blocks shared by every frame. Fields of `mesh` are ignored.
    pub fn write_topology(&mut self, mesh: &Mesh) -> Result<(), Error> {
        if self.closed {
            return Err(SessionError::Closed.into());
        }

        if self.topology.is_some() {
            return Err(SessionError::TopologyAlreadyWritten.into());
        }

        let grid = codec::encode_topology_grid(mesh, TOPOLOGY_GRID_NAME, &mut self.sink)?;
        self.domain.add_child(grid);
        self.topology = Some(Mesh::new(mesh.points.clone(), mesh.cells.clone()));

        tracing::debug!(
            points = mesh.num_points(),
            blocks = mesh.cells.len(),
            "wrote time series topology"
        );

        Ok(())
    }

    /// Append a frame at `time`. Point fields need one row per point and cell fields one
    /// array per cell block of the topology.
    pub fn write_frame(
        &mut self,
        time: f64,
        point_data: &PointData,
        cell_data: &CellData,
    ) -> Result<(), Error> {
        if self.closed {
            return Err(SessionError::Closed.into());
        }

        let topology = self
            .topology
            .as_ref()
            .ok_or(SessionError::TopologyNotWritten)?;

        let mut frame = Element::new("Grid")
            .with_child(Element::new("xi:include").with_attribute("xpointer", template_xpointer()))
            .with_child(Element::new("Time").with_attribute("Value", utils::shortest_float(time)));

        codec::encode_attributes(topology, point_data, cell_data, &mut self.sink, &mut frame)?;

        self.collection.add_child(frame);
        self.frames += 1;

        tracing::trace!(time, frame = self.frames - 1, "wrote time series frame");

        Ok(())
    }

    /// number of frames written so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finalize the side-car and write the document. Closing a closed session does nothing.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let collection = std::mem::take(&mut self.collection);
        let mut domain = std::mem::take(&mut self.domain);
        domain.add_child(collection);

        self.sink.finalize()?;
        tree::serialize_file(&document_root(domain), &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            frames = self.frames,
            "closed time series"
        );

        Ok(())
    }
}

impl Drop for TimeSeriesWriter {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        if let Err(err) = self.close() {
            tracing::error!(path = %self.path.display(), %err, "failed to close time series");
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Time and fields of one frame of a time series
pub struct Frame {
    pub time: f64,
    pub point_data: PointData,
    pub cell_data: CellData,
}

/// Reads a time series document written by [`TimeSeriesWriter`] or another producer that
/// follows the same layout
pub struct TimeSeriesReader {
    source: ReferenceSource,
    topology: Mesh,
    layouts: Vec<TopologyLayout>,
    frames: Vec<Element>,
    times: Vec<f64>,
}

impl TimeSeriesReader {
    /// Parse the document at `path` and read its shared topology. Frame data is only read by
    /// [`read_frame`](Self::read_frame).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let root = tree::parse_file(path)?;
        let domain = read_xdmf::domain(&root)?;

        let template = domain
            .children_named("Grid")
            .find(|grid| grid.attribute("Name") == Some(TOPOLOGY_GRID_NAME))
            .ok_or_else(|| {
                let child = format!("Grid Name=\"{TOPOLOGY_GRID_NAME}\"");
                FormatError::from(MissingElement::new("Domain".into(), child))
            })?;

        let collection = domain
            .children_named("Grid")
            .find(|grid| grid.attribute("GridType").map(str::trim) == Some("Collection"))
            .ok_or_else(|| {
                let child = String::from("temporal collection Grid");
                FormatError::from(MissingElement::new("Domain".into(), child))
            })?;

        if let Some(collection_type) = collection.attribute("CollectionType") {
            if collection_type.trim() != "Temporal" {
                let grid_type = format!("Collection/{collection_type}");
                return Err(UnsupportedFeature::GridType(grid_type).into());
            }
        }

        let mut source = ReferenceSource::new(path);
        let (topology, layouts) = codec::decode_topology_grid(template, &mut source)?;

        let frames = collection.children_named("Grid").cloned().collect::<Vec<_>>();
        let times = frames
            .iter()
            .map(frame_time)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            path = %path.display(),
            frames = frames.len(),
            "opened time series"
        );

        Ok(Self {
            source,
            topology,
            layouts,
            frames,
            times,
        })
    }

    /// the shared points and cell blocks, without fields
    pub fn read_topology(&self) -> Mesh {
        self.topology.clone()
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// time of every frame, in document order
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Load the fields of frame `index` and check them against the topology
    pub fn read_frame(&mut self, index: usize) -> Result<Frame, Error> {
        let frame = self.frames.get(index).ok_or(SessionError::FrameOutOfRange {
            index,
            count: self.frames.len(),
        })?;

        let (point_data, cell_data) =
            codec::decode_attributes(frame, &self.topology, &self.layouts, &mut self.source)?;

        self.topology.validate_point_data(&point_data)?;
        self.topology.validate_cell_data(&cell_data)?;

        Ok(Frame {
            time: self.times[index],
            point_data,
            cell_data,
        })
    }
}

/// check that a frame includes the shared topology and read its time
fn frame_time(frame: &Element) -> Result<f64, FormatError> {
    let reference = format!("[@Name=\"{TOPOLOGY_GRID_NAME}\"]");
    let includes_template = frame
        .children_named("xi:include")
        .filter_map(|include| include.attribute("xpointer"))
        .any(|xpointer| xpointer.contains(&reference));

    if !includes_template {
        let child = format!("xi:include of the `{TOPOLOGY_GRID_NAME}` grid");
        return Err(MissingElement::new("Grid".into(), child).into());
    }

    let mut times = frame.children_named("Time");
    let time = times
        .next()
        .ok_or_else(|| MissingElement::new("Grid".into(), "Time".into()))?;

    if times.next().is_some() {
        let err = UnexpectedElement::new("a single Time element", "a second `Time` element");
        return Err(err.into());
    }

    time.parse_attribute("Value", "a floating point time")
}
