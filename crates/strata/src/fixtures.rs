//! Shared model types exercised by the conversion and blackboard tests.
//!
//! Descriptors here are written out by hand, exactly the way generated
//! introspection tooling would emit them.

use std::collections::HashMap;

use crate::blackboard::Blackboard;
use crate::error::{ReadError, WriteError};
use crate::graph::{
    CustomSerializable, FromType, GetTypeMeta, Outdated, TypeGraph, TypeMeta, TypeTraitCustom,
    TypeTraitOutdated,
};
use crate::info::{PropertyInfo, TypeNode};
use crate::persist::{Persist, take_value};
use crate::serde::{DeserializeDriver, SerializeDriver};

use serde_json::{Map, Value};

/// A graph with every fixture type registered.
pub fn test_graph() -> TypeGraph {
    let mut graph = TypeGraph::new();
    graph.register::<Person>();
    graph.register::<VersionedModel1>();
    graph.register::<VersionedModel2>();
    graph.register::<VersionedModel3>();
    graph.register::<ScoreV1>();
    graph.register::<Score>();
    graph.register::<Profile>();
    graph.register::<Label>();
    graph.register::<Preferences>();
    graph.register::<Zoo>();
    graph.register::<Journal>();
    graph.register::<GameData>();
    graph.register::<AudioSettings>();
    graph
}

fn take<T: Persist>(value: Box<dyn Persist>) -> Result<T, ReadError> {
    take_value::<T>(value).map_err(|value| {
        ReadError::malformed(format!("unexpected value type `{}`", (*value).type_name()))
    })
}

// -----------------------------------------------------------------------------
// Person / Dog / Cat — polymorphic pet slot

#[derive(Debug)]
pub struct Person {
    pub name: String,
    pub age: i64,
    pub pet: Box<dyn Persist>,
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.age == other.age && PartialEq::eq(&self.pet, &other.pet)
    }
}

#[derive(Debug, PartialEq)]
pub struct Dog {
    pub name: String,
    pub bark_volume: i64,
}

#[derive(Debug, PartialEq)]
pub struct Cat {
    pub name: String,
    pub meow_volume: i64,
}

impl GetTypeMeta for Person {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Person>("person", 1)
            .with_factory(|| {
                Box::new(Person {
                    name: String::new(),
                    age: 0,
                    pet: Box::new(Dog {
                        name: String::new(),
                        bark_volume: 0,
                    }),
                })
            })
            .with_property(
                PropertyInfo::new("age", TypeNode::of::<i64>())
                    .persisted("age")
                    .with_getter(|value| &value.downcast_ref::<Person>().unwrap().age)
                    .with_setter(|value, age| {
                        value.downcast_mut::<Person>().unwrap().age = take(age)?;
                        Ok(())
                    }),
            )
            .with_property(
                PropertyInfo::new("name", TypeNode::of::<String>())
                    .persisted("name")
                    .with_getter(|value| &value.downcast_ref::<Person>().unwrap().name)
                    .with_setter(|value, name| {
                        value.downcast_mut::<Person>().unwrap().name = take(name)?;
                        Ok(())
                    }),
            )
            .with_property(
                PropertyInfo::new("pet", TypeNode::dynamic())
                    .persisted("pet")
                    .with_getter(|value| &*value.downcast_ref::<Person>().unwrap().pet)
                    .with_setter(|value, pet| {
                        value.downcast_mut::<Person>().unwrap().pet = pet;
                        Ok(())
                    }),
            )
    }

    fn register_dependencies(graph: &mut TypeGraph) {
        graph.register::<Dog>();
        graph.register::<Cat>();
    }
}

impl GetTypeMeta for Dog {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Dog>("dog", 1)
            .with_factory(|| {
                Box::new(Dog {
                    name: String::new(),
                    bark_volume: 0,
                })
            })
            .with_property(
                PropertyInfo::new("bark_volume", TypeNode::of::<i64>())
                    .persisted("bark_volume")
                    .with_getter(|value| &value.downcast_ref::<Dog>().unwrap().bark_volume)
                    .with_setter(|value, volume| {
                        value.downcast_mut::<Dog>().unwrap().bark_volume = take(volume)?;
                        Ok(())
                    }),
            )
            .with_property(
                PropertyInfo::new("name", TypeNode::of::<String>())
                    .persisted("name")
                    .with_getter(|value| &value.downcast_ref::<Dog>().unwrap().name)
                    .with_setter(|value, name| {
                        value.downcast_mut::<Dog>().unwrap().name = take(name)?;
                        Ok(())
                    }),
            )
    }
}

impl GetTypeMeta for Cat {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Cat>("cat", 1)
            .with_factory(|| {
                Box::new(Cat {
                    name: String::new(),
                    meow_volume: 0,
                })
            })
            .with_property(
                PropertyInfo::new("meow_volume", TypeNode::of::<i64>())
                    .persisted("meow_volume")
                    .with_getter(|value| &value.downcast_ref::<Cat>().unwrap().meow_volume)
                    .with_setter(|value, volume| {
                        value.downcast_mut::<Cat>().unwrap().meow_volume = take(volume)?;
                        Ok(())
                    }),
            )
            .with_property(
                PropertyInfo::new("name", TypeNode::of::<String>())
                    .persisted("name")
                    .with_getter(|value| &value.downcast_ref::<Cat>().unwrap().name)
                    .with_setter(|value, name| {
                        value.downcast_mut::<Cat>().unwrap().name = take(name)?;
                        Ok(())
                    }),
            )
    }
}

// -----------------------------------------------------------------------------
// VersionedModel — a three-step upgrade chain sharing one id

#[derive(Debug, PartialEq)]
pub struct VersionedModel1;

#[derive(Debug, PartialEq)]
pub struct VersionedModel2;

#[derive(Debug, PartialEq)]
pub struct VersionedModel3;

impl Outdated for VersionedModel1 {
    fn upgrade(self, _deps: &Blackboard) -> Box<dyn Persist> {
        Box::new(VersionedModel2)
    }
}

impl Outdated for VersionedModel2 {
    fn upgrade(self, _deps: &Blackboard) -> Box<dyn Persist> {
        Box::new(VersionedModel3)
    }
}

impl GetTypeMeta for VersionedModel1 {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<VersionedModel1>("versioned_model", 1)
            .with_factory(|| Box::new(VersionedModel1))
            .with_trait::<TypeTraitOutdated>(FromType::<VersionedModel1>::from_type())
    }
}

impl GetTypeMeta for VersionedModel2 {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<VersionedModel2>("versioned_model", 2)
            .with_factory(|| Box::new(VersionedModel2))
            .with_trait::<TypeTraitOutdated>(FromType::<VersionedModel2>::from_type())
    }
}

impl GetTypeMeta for VersionedModel3 {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<VersionedModel3>("versioned_model", 3)
            .with_factory(|| Box::new(VersionedModel3))
    }
}

// -----------------------------------------------------------------------------
// Score — an upgrade step that reads its dependency store

/// A value placed on the dependency blackboard by callers; not itself
/// serializable.
#[derive(Debug, PartialEq)]
pub struct Multiplier(pub i64);

#[derive(Debug, PartialEq)]
pub struct ScoreV1 {
    pub points: i64,
}

#[derive(Debug, PartialEq)]
pub struct Score {
    pub points: i64,
}

impl Outdated for ScoreV1 {
    fn upgrade(self, deps: &Blackboard) -> Box<dyn Persist> {
        let multiplier = deps.peek::<Multiplier>().map_or(1, |m| m.0);
        Box::new(Score {
            points: self.points * multiplier,
        })
    }
}

impl GetTypeMeta for ScoreV1 {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<ScoreV1>("score", 1)
            .with_factory(|| Box::new(ScoreV1 { points: 0 }))
            .with_property(
                PropertyInfo::new("points", TypeNode::of::<i64>())
                    .persisted("points")
                    .with_getter(|value| &value.downcast_ref::<ScoreV1>().unwrap().points)
                    .with_setter(|value, points| {
                        value.downcast_mut::<ScoreV1>().unwrap().points = take(points)?;
                        Ok(())
                    }),
            )
            .with_trait::<TypeTraitOutdated>(FromType::<ScoreV1>::from_type())
    }
}

impl GetTypeMeta for Score {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Score>("score", 2)
            .with_factory(|| Box::new(Score { points: 0 }))
            .with_property(
                PropertyInfo::new("points", TypeNode::of::<i64>())
                    .persisted("points")
                    .with_getter(|value| &value.downcast_ref::<Score>().unwrap().points)
                    .with_setter(|value, points| {
                        value.downcast_mut::<Score>().unwrap().points = take(points)?;
                        Ok(())
                    }),
            )
    }
}

// -----------------------------------------------------------------------------
// Profile — construction-time properties mixed with a setter property

#[derive(Debug, PartialEq)]
pub struct Profile {
    pub name: String,
    pub age: i64,
    pub descriptions: Vec<String>,
    pub motto: Option<String>,
}

impl GetTypeMeta for Profile {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Profile>("profile", 1)
            .with_construct(|values| {
                Ok(Box::new(Profile {
                    name: values.take::<String>("name")?,
                    age: values.take::<i64>("age")?,
                    descriptions: values.take::<Vec<String>>("descriptions")?,
                    motto: None,
                }))
            })
            .with_property(
                PropertyInfo::new("age", TypeNode::of::<i64>())
                    .persisted("age")
                    .init()
                    .with_getter(|value| &value.downcast_ref::<Profile>().unwrap().age),
            )
            .with_property(
                PropertyInfo::new("descriptions", TypeNode::list::<String>(TypeNode::of::<String>()))
                    .persisted("descriptions")
                    .init()
                    .with_getter(|value| &value.downcast_ref::<Profile>().unwrap().descriptions),
            )
            .with_property(
                PropertyInfo::new(
                    "motto",
                    TypeNode::nullable::<String>(TypeNode::of::<String>()),
                )
                .persisted("motto")
                .with_getter(|value| &value.downcast_ref::<Profile>().unwrap().motto)
                .with_setter(|value, motto| {
                    value.downcast_mut::<Profile>().unwrap().motto = take(motto)?;
                    Ok(())
                }),
            )
            .with_property(
                PropertyInfo::new("name", TypeNode::of::<String>())
                    .persisted("name")
                    .init()
                    .with_getter(|value| &value.downcast_ref::<Profile>().unwrap().name),
            )
    }
}

// -----------------------------------------------------------------------------
// Label — a readable property with no setter

#[derive(Debug, PartialEq)]
pub struct Label {
    pub text: String,
}

impl GetTypeMeta for Label {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Label>("label", 1)
            .with_factory(|| {
                Box::new(Label {
                    text: String::from("Label"),
                })
            })
            .with_property(
                PropertyInfo::new("text", TypeNode::of::<String>())
                    .persisted("text")
                    .with_getter(|value| &value.downcast_ref::<Label>().unwrap().text),
            )
    }
}

// -----------------------------------------------------------------------------
// Preferences — collection reconciliation policies

#[derive(Debug, PartialEq)]
pub struct Preferences {
    pub nickname: Option<String>,
    pub tags: Option<Vec<String>>,
    pub scores: Vec<i64>,
    pub lookup: HashMap<String, i64>,
    pub favorites: Vec<String>,
}

impl Preferences {
    pub fn empty() -> Self {
        Self {
            nickname: None,
            tags: None,
            scores: Vec::new(),
            lookup: HashMap::new(),
            favorites: vec![String::from("default")],
        }
    }
}

impl GetTypeMeta for Preferences {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Preferences>("preferences", 1)
            .with_factory(|| Box::new(Preferences::empty()))
            .with_property(
                PropertyInfo::new(
                    "favorites",
                    TypeNode::list::<String>(TypeNode::of::<String>()),
                )
                .persisted("favorites")
                .with_default()
                .with_getter(|value| &value.downcast_ref::<Preferences>().unwrap().favorites)
                .with_setter(|value, favorites| {
                    value.downcast_mut::<Preferences>().unwrap().favorites = take(favorites)?;
                    Ok(())
                }),
            )
            .with_property(
                PropertyInfo::new(
                    "lookup",
                    TypeNode::map::<String, i64>(TypeNode::of::<String>(), TypeNode::of::<i64>()),
                )
                .persisted("lookup")
                .with_getter(|value| &value.downcast_ref::<Preferences>().unwrap().lookup)
                .with_setter(|value, lookup| {
                    value.downcast_mut::<Preferences>().unwrap().lookup = take(lookup)?;
                    Ok(())
                }),
            )
            .with_property(
                PropertyInfo::new(
                    "nickname",
                    TypeNode::nullable::<String>(TypeNode::of::<String>()),
                )
                .persisted("nickname")
                .with_getter(|value| &value.downcast_ref::<Preferences>().unwrap().nickname)
                .with_setter(|value, nickname| {
                    value.downcast_mut::<Preferences>().unwrap().nickname = take(nickname)?;
                    Ok(())
                }),
            )
            .with_property(
                PropertyInfo::new("scores", TypeNode::list::<i64>(TypeNode::of::<i64>()))
                    .persisted("scores")
                    .with_getter(|value| &value.downcast_ref::<Preferences>().unwrap().scores)
                    .with_setter(|value, scores| {
                        value.downcast_mut::<Preferences>().unwrap().scores = take(scores)?;
                        Ok(())
                    }),
            )
            .with_property(
                PropertyInfo::new(
                    "tags",
                    TypeNode::nullable::<Vec<String>>(TypeNode::list::<String>(
                        TypeNode::of::<String>(),
                    )),
                )
                .persisted("tags")
                .with_getter(|value| &value.downcast_ref::<Preferences>().unwrap().tags)
                .with_setter(|value, tags| {
                    value.downcast_mut::<Preferences>().unwrap().tags = take(tags)?;
                    Ok(())
                }),
            )
    }
}

// -----------------------------------------------------------------------------
// Zoo / Pen — a sequence of entries with polymorphic occupants

#[derive(Debug)]
pub struct Pen {
    pub occupant: Box<dyn Persist>,
}

impl PartialEq for Pen {
    fn eq(&self, other: &Self) -> bool {
        PartialEq::eq(&self.occupant, &other.occupant)
    }
}

#[derive(Debug, PartialEq)]
pub struct Zoo {
    pub pens: Vec<Pen>,
}

impl GetTypeMeta for Pen {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Pen>("pen", 1)
            .with_factory(|| {
                Box::new(Pen {
                    occupant: Box::new(Dog {
                        name: String::new(),
                        bark_volume: 0,
                    }),
                })
            })
            .with_property(
                PropertyInfo::new("occupant", TypeNode::dynamic())
                    .persisted("occupant")
                    .with_getter(|value| &*value.downcast_ref::<Pen>().unwrap().occupant)
                    .with_setter(|value, occupant| {
                        value.downcast_mut::<Pen>().unwrap().occupant = occupant;
                        Ok(())
                    }),
            )
    }
}

impl GetTypeMeta for Zoo {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Zoo>("zoo", 1)
            .with_factory(|| Box::new(Zoo { pens: Vec::new() }))
            .with_property(
                PropertyInfo::new("pens", TypeNode::list::<Pen>(TypeNode::of::<Pen>()))
                    .persisted("pens")
                    .with_getter(|value| &value.downcast_ref::<Zoo>().unwrap().pens)
                    .with_setter(|value, pens| {
                        value.downcast_mut::<Zoo>().unwrap().pens = take(pens)?;
                        Ok(())
                    }),
            )
    }

    fn register_dependencies(graph: &mut TypeGraph) {
        graph.register::<Pen>();
        graph.register::<Dog>();
        graph.register::<Cat>();
    }
}

// -----------------------------------------------------------------------------
// Journal — custom-serialization hooks

#[derive(Debug, PartialEq)]
pub struct Journal {
    pub entries: Vec<String>,
}

impl GetTypeMeta for Journal {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Journal>("journal", 1)
            .with_factory(|| {
                Box::new(Journal {
                    entries: Vec::new(),
                })
            })
            .with_property(
                PropertyInfo::new("entries", TypeNode::list::<String>(TypeNode::of::<String>()))
                    .persisted("entries")
                    .with_getter(|value| &value.downcast_ref::<Journal>().unwrap().entries)
                    .with_setter(|value, entries| {
                        value.downcast_mut::<Journal>().unwrap().entries = take(entries)?;
                        Ok(())
                    }),
            )
            .with_trait::<TypeTraitCustom>(FromType::<Journal>::from_type())
    }
}

impl CustomSerializable for Journal {
    fn on_serialized(
        &self,
        _driver: &SerializeDriver<'_>,
        node: &mut Map<String, Value>,
    ) -> Result<(), WriteError> {
        // A derived field the declarative properties cannot express.
        node.insert(
            String::from("entry_count"),
            Value::from(self.entries.len() as u64),
        );
        Ok(())
    }

    fn on_deserialized(
        mut self,
        _driver: &DeserializeDriver<'_>,
        node: &Map<String, Value>,
    ) -> Result<Box<dyn Persist>, ReadError> {
        // Full replacement is allowed; this hook just augments.
        if node.get("entry_count").and_then(Value::as_u64) == Some(0) && self.entries.is_empty() {
            self.entries.push(String::from("(empty journal)"));
        }
        Ok(Box::new(self))
    }
}

// -----------------------------------------------------------------------------
// Blackboard slot types

#[derive(Debug, PartialEq, Clone)]
pub struct GameData {
    pub level: u64,
}

impl GetTypeMeta for GameData {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<GameData>("game_data", 1)
            .with_factory(|| Box::new(GameData { level: 0 }))
            .with_property(
                PropertyInfo::new("level", TypeNode::of::<u64>())
                    .persisted("level")
                    .with_getter(|value| &value.downcast_ref::<GameData>().unwrap().level)
                    .with_setter(|value, level| {
                        value.downcast_mut::<GameData>().unwrap().level = take(level)?;
                        Ok(())
                    }),
            )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct AudioSettings {
    pub volume: i64,
}

impl GetTypeMeta for AudioSettings {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<AudioSettings>("audio_settings", 1)
            .with_factory(|| Box::new(AudioSettings { volume: 10 }))
            .with_property(
                PropertyInfo::new("volume", TypeNode::of::<i64>())
                    .persisted("volume")
                    .with_getter(|value| &value.downcast_ref::<AudioSettings>().unwrap().volume)
                    .with_setter(|value, volume| {
                        value.downcast_mut::<AudioSettings>().unwrap().volume = take(volume)?;
                        Ok(())
                    }),
            )
    }
}

// -----------------------------------------------------------------------------
// Distributed registration

#[cfg(feature = "auto_register")]
#[derive(Debug, PartialEq)]
pub struct AutoMarker;

#[cfg(feature = "auto_register")]
impl GetTypeMeta for AutoMarker {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<AutoMarker>("auto_marker", 1).with_factory(|| Box::new(AutoMarker))
    }
}

#[cfg(feature = "auto_register")]
inventory::submit! { crate::graph::AutoRegistration::new::<AutoMarker>() }
