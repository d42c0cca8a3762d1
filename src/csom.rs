//! CSOM request bodies for the ProcessQuery endpoint.
//!
//! A request lists object paths (how to reach server objects) and actions
//! (what to do with them). Object paths and actions share one id sequence;
//! actions and child paths refer to object paths by id.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::CsomError;

const CLIENT_QUERY_NS: &str = "http://schemas.microsoft.com/sharepoint/clientquery/2009";
const SCHEMA_VERSION: &str = "15.0.0.0";
const LIBRARY_VERSION: &str = "16.0.0.0";
const DEFAULT_APPLICATION_NAME: &str = "sp-odata";

/// Type id of `SP.ClientContext`, whose static `Current` property roots most paths.
pub const CLIENT_CONTEXT_TYPE_ID: &str = "{3747adcd-a3c3-41b9-bfab-4a64dd2f1e0a}";

/// Typed method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    String(String),
    Int32(i32),
    Boolean(bool),
    Null,
}

impl Parameter {
    fn type_name(&self) -> &'static str {
        match self {
            Parameter::String(_) => "String",
            Parameter::Int32(_) => "Int32",
            Parameter::Boolean(_) => "Boolean",
            Parameter::Null => "Null",
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            Parameter::String(s) => Some(s.clone()),
            Parameter::Int32(n) => Some(n.to_string()),
            Parameter::Boolean(b) => Some(b.to_string()),
            Parameter::Null => None,
        }
    }
}

/// How to reach a server object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectPath {
    StaticProperty { type_id: String, name: String },
    Property { parent_id: u32, name: String },
    Method {
        parent_id: u32,
        name: String,
        parameters: Vec<Parameter>,
    },
    Identity { name: String },
}

impl ObjectPath {
    /// `SP.ClientContext.Current`.
    pub fn current_context() -> Self {
        ObjectPath::StaticProperty {
            type_id: CLIENT_CONTEXT_TYPE_ID.to_string(),
            name: "Current".to_string(),
        }
    }

    pub fn property(parent_id: u32, name: impl Into<String>) -> Self {
        ObjectPath::Property {
            parent_id,
            name: name.into(),
        }
    }

    pub fn method(parent_id: u32, name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        ObjectPath::Method {
            parent_id,
            name: name.into(),
            parameters,
        }
    }

    fn parent_id(&self) -> Option<u32> {
        match self {
            ObjectPath::Property { parent_id, .. } | ObjectPath::Method { parent_id, .. } => {
                Some(*parent_id)
            }
            ObjectPath::StaticProperty { .. } | ObjectPath::Identity { .. } => None,
        }
    }
}

/// Operation performed on an object path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Materialize the object path on the server.
    ObjectPath { object_path_id: u32 },
    /// Return object properties in the reply.
    Query {
        object_path_id: u32,
        select_all: bool,
        properties: Vec<String>,
    },
    /// Invoke a method for its side effect.
    Method {
        object_path_id: u32,
        name: String,
        parameters: Vec<Parameter>,
    },
}

impl Action {
    fn object_path_id(&self) -> u32 {
        match self {
            Action::ObjectPath { object_path_id }
            | Action::Query { object_path_id, .. }
            | Action::Method { object_path_id, .. } => *object_path_id,
        }
    }
}

/// Accumulates object paths and actions into one ProcessQuery body.
#[derive(Debug, Clone)]
pub struct CsomBuilder {
    application_name: String,
    next_id: u32,
    object_paths: Vec<(u32, ObjectPath)>,
    actions: Vec<(u32, Action)>,
}

impl Default for CsomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsomBuilder {
    pub fn new() -> Self {
        Self {
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            next_id: 0,
            object_paths: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Register an object path and return its id.
    pub fn add_object_path(&mut self, path: ObjectPath) -> u32 {
        let id = self.take_id();
        self.object_paths.push((id, path));
        id
    }

    /// Register an action and return its id.
    pub fn add_action(&mut self, action: Action) -> u32 {
        let id = self.take_id();
        self.actions.push((id, action));
        id
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Serialize the `Request` envelope.
    ///
    /// # Errors
    ///
    /// Returns `CsomError::UnknownObjectPath` if an action or child path
    /// refers to an id that is not a registered object path.
    pub fn to_xml(&self) -> Result<String, CsomError> {
        self.check_references()?;

        let mut writer = Writer::new(Vec::new());
        write(
            &mut writer,
            Event::Start(start(
                "Request",
                &[
                    ("AddExpandoFieldTypeSuffix", "true"),
                    ("SchemaVersion", SCHEMA_VERSION),
                    ("LibraryVersion", LIBRARY_VERSION),
                    ("ApplicationName", self.application_name.as_str()),
                    ("xmlns", CLIENT_QUERY_NS),
                ],
            )),
        )?;

        write(&mut writer, Event::Start(BytesStart::new("Actions")))?;
        for (id, action) in &self.actions {
            write_action(&mut writer, *id, action)?;
        }
        write(&mut writer, Event::End(BytesEnd::new("Actions")))?;

        write(&mut writer, Event::Start(BytesStart::new("ObjectPaths")))?;
        for (id, path) in &self.object_paths {
            write_object_path(&mut writer, *id, path)?;
        }
        write(&mut writer, Event::End(BytesEnd::new("ObjectPaths")))?;

        write(&mut writer, Event::End(BytesEnd::new("Request")))?;

        String::from_utf8(writer.into_inner()).map_err(|e| CsomError::Write {
            message: e.to_string(),
        })
    }

    fn check_references(&self) -> Result<(), CsomError> {
        let known = |id: u32| self.object_paths.iter().any(|(path_id, _)| *path_id == id);
        let referenced = self
            .object_paths
            .iter()
            .filter_map(|(_, path)| path.parent_id())
            .chain(self.actions.iter().map(|(_, action)| action.object_path_id()));
        for id in referenced {
            if !known(id) {
                return Err(CsomError::UnknownObjectPath { id });
            }
        }
        Ok(())
    }
}

fn start<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    BytesStart::new(name).with_attributes(attrs.iter().copied())
}

fn write<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), CsomError> {
    writer.write_event(event).map_err(|e| CsomError::Write {
        message: e.to_string(),
    })
}

fn write_object_path<W: Write>(
    writer: &mut Writer<W>,
    id: u32,
    path: &ObjectPath,
) -> Result<(), CsomError> {
    let id = id.to_string();
    match path {
        ObjectPath::StaticProperty { type_id, name } => write(
            writer,
            Event::Empty(start(
                "StaticProperty",
                &[("Id", id.as_str()), ("TypeId", type_id.as_str()), ("Name", name.as_str())],
            )),
        ),
        ObjectPath::Property { parent_id, name } => {
            let parent = parent_id.to_string();
            write(
                writer,
                Event::Empty(start(
                    "Property",
                    &[("Id", id.as_str()), ("ParentId", parent.as_str()), ("Name", name.as_str())],
                )),
            )
        }
        ObjectPath::Method {
            parent_id,
            name,
            parameters,
        } => {
            let parent = parent_id.to_string();
            write_with_parameters(
                writer,
                start("Method", &[("Id", id.as_str()), ("ParentId", parent.as_str()), ("Name", name.as_str())]),
                parameters,
            )
        }
        ObjectPath::Identity { name } => write(
            writer,
            Event::Empty(start("Identity", &[("Id", id.as_str()), ("Name", name.as_str())])),
        ),
    }
}

fn write_action<W: Write>(writer: &mut Writer<W>, id: u32, action: &Action) -> Result<(), CsomError> {
    let id = id.to_string();
    let path = action.object_path_id().to_string();
    match action {
        Action::ObjectPath { .. } => write(
            writer,
            Event::Empty(start("ObjectPath", &[("Id", id.as_str()), ("ObjectPathId", path.as_str())])),
        ),
        Action::Query {
            select_all,
            properties,
            ..
        } => {
            write(
                writer,
                Event::Start(start("Query", &[("Id", id.as_str()), ("ObjectPathId", path.as_str())])),
            )?;
            let select_all = select_all.to_string();
            write(
                writer,
                Event::Start(start("Query", &[("SelectAllProperties", select_all.as_str())])),
            )?;
            if properties.is_empty() {
                write(writer, Event::Empty(BytesStart::new("Properties")))?;
            } else {
                write(writer, Event::Start(BytesStart::new("Properties")))?;
                for name in properties {
                    write(
                        writer,
                        Event::Empty(start(
                            "Property",
                            &[("Name", name.as_str()), ("ScalarProperty", "true")],
                        )),
                    )?;
                }
                write(writer, Event::End(BytesEnd::new("Properties")))?;
            }
            write(writer, Event::End(BytesEnd::new("Query")))?;
            write(writer, Event::End(BytesEnd::new("Query")))
        }
        Action::Method {
            name, parameters, ..
        } => write_with_parameters(
            writer,
            start("Method", &[("Name", name.as_str()), ("Id", id.as_str()), ("ObjectPathId", path.as_str())]),
            parameters,
        ),
    }
}

fn write_with_parameters<W: Write>(
    writer: &mut Writer<W>,
    element: BytesStart<'_>,
    parameters: &[Parameter],
) -> Result<(), CsomError> {
    if parameters.is_empty() {
        return write(writer, Event::Empty(element));
    }

    let end = element.to_end().into_owned();
    write(writer, Event::Start(element))?;
    write(writer, Event::Start(BytesStart::new("Parameters")))?;
    for parameter in parameters {
        let param = start("Parameter", &[("Type", parameter.type_name())]);
        match parameter.text() {
            Some(text) => {
                write(writer, Event::Start(param))?;
                write(writer, Event::Text(BytesText::new(&text)))?;
                write(writer, Event::End(BytesEnd::new("Parameter")))?;
            }
            None => write(writer, Event::Empty(param))?,
        }
    }
    write(writer, Event::End(BytesEnd::new("Parameters")))?;
    write(writer, Event::End(end))
}
