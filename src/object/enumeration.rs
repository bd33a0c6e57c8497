use std::any::Any;
use std::rc::Rc;

use crate::object::LoxObject;
use crate::value::Value;

/// One member of an `enum`; members compare by identity.
#[derive(Debug)]
pub struct EnumMember {
    enum_name: Rc<str>,
    name: Rc<str>,
    ordinal: i64,
}

impl LoxObject for EnumMember {
    fn type_name(&self) -> &'static str {
        "enum member"
    }

    fn stringify(&self) -> String {
        format!("{}.{}", self.enum_name, self.name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get(self: Rc<Self>, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::Str(self.name.clone())),
            "ordinal" => Some(Value::Int(self.ordinal)),
            _ => None,
        }
    }
}

/// The value bound to an `enum` declaration's name.
#[derive(Debug)]
pub struct EnumObject {
    name: Rc<str>,
    members: Vec<Rc<EnumMember>>,
}

impl EnumObject {
    pub fn new<'a>(name: &str, members: impl IntoIterator<Item = &'a str>) -> Self {
        let name: Rc<str> = Rc::from(name);

        let members = members
            .into_iter()
            .zip(0..)
            .map(|(member, ordinal)| {
                Rc::new(EnumMember {
                    enum_name: name.clone(),
                    name: Rc::from(member),
                    ordinal,
                })
            })
            .collect();

        Self { name, members }
    }

    fn member_values(&self) -> Vec<Value> {
        self.members
            .iter()
            .map(|m| Value::Object(m.clone() as Rc<dyn LoxObject>))
            .collect()
    }
}

impl LoxObject for EnumObject {
    fn type_name(&self) -> &'static str {
        "enum"
    }

    fn stringify(&self) -> String {
        format!("<enum {}>", self.name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get(self: Rc<Self>, name: &str) -> Option<Value> {
        self.members
            .iter()
            .find(|m| &*m.name == name)
            .map(|m| Value::Object(m.clone() as Rc<dyn LoxObject>))
    }

    fn iterate(&self) -> Option<Vec<Value>> {
        Some(self.member_values())
    }

    fn length(&self) -> Option<usize> {
        Some(self.members.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_know_their_name_and_ordinal() {
        let color = Rc::new(EnumObject::new("Color", ["RED", "GREEN"]));
        let green = color.clone().get("GREEN").unwrap();

        assert_eq!(green.to_string(), "Color.GREEN");

        let Value::Object(member) = green else {
            panic!("enum member should be an object");
        };
        assert_eq!(member.clone().get("ordinal"), Some(Value::Int(1)));
        assert_eq!(member.get("name"), Some(Value::from("GREEN")));
    }

    #[test]
    fn members_are_identical_only_to_themselves() {
        let color = Rc::new(EnumObject::new("Color", ["RED", "GREEN"]));
        let red = color.clone().get("RED").unwrap();

        assert!(red.equals(&color.clone().get("RED").unwrap()));
        assert!(!red.equals(&color.get("GREEN").unwrap()));
    }
}
