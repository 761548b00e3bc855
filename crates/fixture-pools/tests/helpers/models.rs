//! Fixture models shared by the integration tests.

use fixture_pools::{Instance, Model};

#[derive(Debug, Default, Model)]
pub struct User {
	pub id: String,
	pub name: String,
	pub email: String,
	pub group: Option<Instance<Group>>,
}

#[derive(Debug, Default, Model)]
pub struct Group {
	pub id: String,
	pub name: String,
	pub owner: Option<Instance<User>>,
	pub members: Vec<Instance<User>>,
}

#[derive(Debug, Default, Model)]
pub struct Example {
	pub foo: u64,
	pub bar: String,
	pub baz: String,
	pub rand: i64,
}

#[derive(Debug, Default, Model)]
#[model(name = "TypeX")]
pub struct Foo {
	pub label: String,
}

#[derive(Debug, Default, Model)]
pub struct Person {
	pub name: String,
	pub age: u32,
}

#[derive(Debug, Default, Model)]
pub struct Employee {
	#[model(inherit)]
	pub person: Person,

	/// Shadows `Person::name`.
	pub name: String,

	#[model(rename = "employer")]
	pub company: Option<String>,

	#[model(skip)]
	pub scratch: Vec<u8>,
}
