use std::iter::Peekable;
use anyhow::{anyhow, bail, Context, Result};
use java_string::{Chars, JavaCodePoint, JavaString};
use crate::tree::class::{ClassSignature, ClassSignatureSlice};
use crate::tree::descriptor::Type;
use crate::tree::field::{FieldSignature, FieldSignatureSlice};
use crate::tree::method::{MethodSignature, MethodSignatureSlice};

/// A generic class, interface or type-variable reference, as they show up as bounds,
/// superclasses/superinterfaces, and type arguments.
///
/// Grammar: [`FieldTypeSignature`](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html#jvms-4.7.9.1),
/// minus the array case (see [`TypeSignature`]).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FieldTypeSignature {
	Class(ClassTypeSignature),
	TypeVariable(JavaString),
}

/// `L PackageSpecifier? SimpleClassTypeSignature ClassTypeSignatureSuffix* ;`
///
/// `name` holds the internal name (package-qualified, `/`-separated) of the outermost class;
/// `suffix` holds zero or more `.Identifier TypeArguments?` continuations for statically nested
/// classes, each with their own type arguments.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClassTypeSignature {
	pub name: JavaString,
	pub type_arguments: Vec<TypeArgument>,
	pub suffix: Vec<SimpleClassTypeSignature>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SimpleClassTypeSignature {
	pub name: JavaString,
	pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TypeArgument {
	/// Bare `*`.
	Wildcard,
	/// `+ FieldTypeSignature`.
	Extends(Box<FieldTypeSignature>),
	/// `- FieldTypeSignature`.
	Super(Box<FieldTypeSignature>),
	/// A `FieldTypeSignature` with no wildcard indicator.
	Exact(Box<FieldTypeSignature>),
}

/// A `TypeSignature`: either a primitive [`Type`] or a [`FieldTypeSignature`] (which covers
/// both class types and arrays thereof).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TypeSignature {
	Base(Type),
	Array(u8, Box<TypeSignature>),
	Field(FieldTypeSignature),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FormalTypeParameter {
	pub name: JavaString,
	pub class_bound: Option<FieldTypeSignature>,
	pub interface_bounds: Vec<FieldTypeSignature>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParsedClassSignature {
	pub type_parameters: Vec<FormalTypeParameter>,
	pub super_class: ClassTypeSignature,
	pub super_interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ThrowsSignature {
	Class(ClassTypeSignature),
	TypeVariable(JavaString),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParsedMethodSignature {
	pub type_parameters: Vec<FormalTypeParameter>,
	pub parameter_types: Vec<TypeSignature>,
	/// `None` is the `V` (void) result.
	pub return_type: Option<TypeSignature>,
	pub throws: Vec<ThrowsSignature>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParsedFieldSignature(pub FieldTypeSignature);

const LT: JavaCodePoint = JavaCodePoint::from_char('<');
const GT: JavaCodePoint = JavaCodePoint::from_char('>');
const COLON: JavaCodePoint = JavaCodePoint::from_char(':');
const SEMI: JavaCodePoint = JavaCodePoint::from_char(';');
const SLASH: JavaCodePoint = JavaCodePoint::from_char('/');
const DOT: JavaCodePoint = JavaCodePoint::from_char('.');
const PLUS: JavaCodePoint = JavaCodePoint::from_char('+');
const MINUS: JavaCodePoint = JavaCodePoint::from_char('-');
const STAR: JavaCodePoint = JavaCodePoint::from_char('*');
const CARET: JavaCodePoint = JavaCodePoint::from_char('^');

fn read_identifier(chars: &mut Peekable<Chars>) -> Result<JavaString> {
	let mut s = JavaString::new();
	while let Some(&c) = chars.peek() {
		if c == ';' || c == '.' || c == '/' || c == '<' || c == '>' || c == ':' {
			break;
		}
		s.push_java(c);
		chars.next();
	}
	if s.is_empty() {
		bail!("expected identifier, got nothing");
	}
	Ok(s)
}

fn read_base_type(c: JavaCodePoint) -> Option<Type> {
	Some(match c {
		x if x == JavaCodePoint::from_char('B') => Type::B,
		x if x == JavaCodePoint::from_char('C') => Type::C,
		x if x == JavaCodePoint::from_char('D') => Type::D,
		x if x == JavaCodePoint::from_char('F') => Type::F,
		x if x == JavaCodePoint::from_char('I') => Type::I,
		x if x == JavaCodePoint::from_char('J') => Type::J,
		x if x == JavaCodePoint::from_char('S') => Type::S,
		x if x == JavaCodePoint::from_char('Z') => Type::Z,
		_ => return None,
	})
}

fn write_base_type(t: &Type, s: &mut JavaString) {
	s.push(match t {
		Type::B => 'B', Type::C => 'C', Type::D => 'D', Type::F => 'F',
		Type::I => 'I', Type::J => 'J', Type::S => 'S', Type::Z => 'Z',
		_ => unreachable!("not a base type"),
	});
}

fn read_class_type_signature(chars: &mut Peekable<Chars>) -> Result<ClassTypeSignature> {
	if chars.next_if_eq(&'L').is_none() {
		bail!("class type signature doesn't start with 'L'");
	}

	let mut name = JavaString::new();
	loop {
		let segment = read_identifier(chars)?;
		name.push_java_str(&segment);
		if chars.next_if_eq(&'/').is_some() {
			name.push('/');
			continue;
		}
		break;
	}

	let type_arguments = read_type_arguments(chars)?;

	let mut suffix = Vec::new();
	while chars.next_if_eq(&'.').is_some() {
		let name = read_identifier(chars)?;
		let type_arguments = read_type_arguments(chars)?;
		suffix.push(SimpleClassTypeSignature { name, type_arguments });
	}

	if chars.next_if_eq(&';').is_none() {
		bail!("class type signature doesn't end with ';'");
	}

	Ok(ClassTypeSignature { name, type_arguments, suffix })
}

fn write_class_type_signature(t: &ClassTypeSignature, s: &mut JavaString) {
	s.push('L');
	s.push_java_str(&t.name);
	write_type_arguments(&t.type_arguments, s);
	for suffix in &t.suffix {
		s.push('.');
		s.push_java_str(&suffix.name);
		write_type_arguments(&suffix.type_arguments, s);
	}
	s.push(';');
}

fn read_type_arguments(chars: &mut Peekable<Chars>) -> Result<Vec<TypeArgument>> {
	if chars.next_if_eq(&'<').is_none() {
		return Ok(Vec::new());
	}

	let mut args = Vec::new();
	loop {
		if chars.next_if_eq(&'>').is_some() {
			break;
		}

		let arg = if chars.next_if_eq(&'*').is_some() {
			TypeArgument::Wildcard
		} else if chars.next_if_eq(&'+').is_some() {
			TypeArgument::Extends(Box::new(read_field_type_signature(chars)?))
		} else if chars.next_if_eq(&'-').is_some() {
			TypeArgument::Super(Box::new(read_field_type_signature(chars)?))
		} else {
			TypeArgument::Exact(Box::new(read_field_type_signature(chars)?))
		};
		args.push(arg);
	}

	Ok(args)
}

fn write_type_arguments(args: &[TypeArgument], s: &mut JavaString) {
	if args.is_empty() {
		return;
	}
	s.push('<');
	for arg in args {
		match arg {
			TypeArgument::Wildcard => s.push('*'),
			TypeArgument::Extends(t) => { s.push('+'); write_field_type_signature(t, s); },
			TypeArgument::Super(t) => { s.push('-'); write_field_type_signature(t, s); },
			TypeArgument::Exact(t) => write_field_type_signature(t, s),
		}
	}
	s.push('>');
}

fn read_field_type_signature(chars: &mut Peekable<Chars>) -> Result<FieldTypeSignature> {
	match chars.peek().copied() {
		Some(c) if c == 'L' => Ok(FieldTypeSignature::Class(read_class_type_signature(chars)?)),
		Some(c) if c == 'T' => {
			chars.next();
			let name = read_identifier(chars)?;
			if chars.next_if_eq(&';').is_none() {
				bail!("type variable signature doesn't end with ';'");
			}
			Ok(FieldTypeSignature::TypeVariable(name))
		},
		other => bail!("unexpected char {other:?} in field type signature, expected 'L' or 'T'"),
	}
}

fn write_field_type_signature(t: &FieldTypeSignature, s: &mut JavaString) {
	match t {
		FieldTypeSignature::Class(c) => write_class_type_signature(c, s),
		FieldTypeSignature::TypeVariable(name) => {
			s.push('T');
			s.push_java_str(name);
			s.push(';');
		},
	}
}

fn read_type_signature(chars: &mut Peekable<Chars>) -> Result<TypeSignature> {
	let mut array_dimension = 0u8;
	while chars.next_if_eq(&'[').is_some() {
		array_dimension += 1;
	}

	let inner = match chars.peek().copied() {
		Some(c) if read_base_type(c).is_some() => {
			let t = read_base_type(c).unwrap();
			chars.next();
			TypeSignature::Base(t)
		},
		Some(_) => TypeSignature::Field(read_field_type_signature(chars)
			.with_context(|| anyhow!("failed to read type signature"))?),
		None => bail!("unexpected abrupt ending of type signature"),
	};

	let mut result = inner;
	for _ in 0..array_dimension {
		result = TypeSignature::Array(1, Box::new(result));
	}
	Ok(result)
}

fn write_type_signature(t: &TypeSignature, s: &mut JavaString) {
	match t {
		TypeSignature::Base(b) => write_base_type(b, s),
		TypeSignature::Array(n, inner) => {
			for _ in 0..*n {
				s.push('[');
			}
			write_type_signature(inner, s);
		},
		TypeSignature::Field(f) => write_field_type_signature(f, s),
	}
}

fn read_formal_type_parameters(chars: &mut Peekable<Chars>) -> Result<Vec<FormalTypeParameter>> {
	if chars.next_if_eq(&'<').is_none() {
		return Ok(Vec::new());
	}

	let mut parameters = Vec::new();
	loop {
		if chars.next_if_eq(&'>').is_some() {
			break;
		}

		let name = read_identifier(chars)?;
		if chars.next_if_eq(&':').is_none() {
			bail!("formal type parameter {name:?} not followed by ':'");
		}

		let class_bound = if chars.peek().copied() == Some(JavaCodePoint::from_char('L')) || chars.peek().copied() == Some(JavaCodePoint::from_char('T')) {
			Some(read_field_type_signature(chars)?)
		} else {
			None
		};

		let mut interface_bounds = Vec::new();
		while chars.next_if_eq(&':').is_some() {
			interface_bounds.push(read_field_type_signature(chars)?);
		}

		parameters.push(FormalTypeParameter { name, class_bound, interface_bounds });
	}

	Ok(parameters)
}

fn write_formal_type_parameters(parameters: &[FormalTypeParameter], s: &mut JavaString) {
	if parameters.is_empty() {
		return;
	}
	s.push('<');
	for parameter in parameters {
		s.push_java_str(&parameter.name);
		s.push(':');
		if let Some(class_bound) = &parameter.class_bound {
			write_field_type_signature(class_bound, s);
		}
		for interface_bound in &parameter.interface_bounds {
			s.push(':');
			write_field_type_signature(interface_bound, s);
		}
	}
	s.push('>');
}

impl ClassSignatureSlice {
	/// Attempts to parse a class signature.
	///
	/// A class signature is defined by the [grammar](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html#jvms-4.7.9.1)
	/// in the Java Virtual Machine Specification.
	///
	/// The inverse of this function is [`ParsedClassSignature::write`].
	pub fn parse(&self) -> Result<ParsedClassSignature> {
		let mut chars = self.as_inner().chars().peekable();

		let type_parameters = read_formal_type_parameters(&mut chars)
			.with_context(|| anyhow!("failed to read type parameters of class signature {self:?}"))?;
		let super_class = read_class_type_signature(&mut chars)
			.with_context(|| anyhow!("failed to read superclass signature of {self:?}"))?;

		let mut super_interfaces = Vec::new();
		while chars.peek().is_some() {
			super_interfaces.push(read_class_type_signature(&mut chars)
				.with_context(|| anyhow!("failed to read superinterface signature of {self:?}"))?);
		}

		Ok(ParsedClassSignature { type_parameters, super_class, super_interfaces })
	}
}

impl ParsedClassSignature {
	/// Writes a class signature.
	///
	/// The inverse of this function is [`ClassSignatureSlice::parse`].
	pub fn write(&self) -> ClassSignature {
		let mut s = JavaString::new();
		write_formal_type_parameters(&self.type_parameters, &mut s);
		write_class_type_signature(&self.super_class, &mut s);
		for super_interface in &self.super_interfaces {
			write_class_type_signature(super_interface, &mut s);
		}
		unsafe { ClassSignature::from_inner_unchecked(s) }
	}
}

impl FieldSignatureSlice {
	/// Attempts to parse a field signature, a.k.a. a `FieldTypeSignature` (JVMS 4.7.9.1)
	/// excluding the array and base-type cases, which aren't legal at the top level of a
	/// field's signature attribute.
	///
	/// The inverse of this function is [`ParsedFieldSignature::write`].
	pub fn parse(&self) -> Result<ParsedFieldSignature> {
		let mut chars = self.as_inner().chars().peekable();

		let signature = read_field_type_signature(&mut chars)
			.with_context(|| anyhow!("failed to read field signature {self:?}"))?;

		if chars.peek().is_some() {
			bail!("expected end of field signature {self:?}, got {:?} remaining", JavaString::from_iter(chars));
		}

		Ok(ParsedFieldSignature(signature))
	}
}

impl ParsedFieldSignature {
	/// Writes a field signature.
	///
	/// The inverse of this function is [`FieldSignatureSlice::parse`].
	pub fn write(&self) -> FieldSignature {
		let mut s = JavaString::new();
		write_field_type_signature(&self.0, &mut s);
		unsafe { FieldSignature::from_inner_unchecked(s) }
	}
}

impl MethodSignatureSlice {
	/// Attempts to parse a method signature.
	///
	/// A method signature is defined by the [grammar](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html#jvms-4.7.9.1)
	/// in the Java Virtual Machine Specification.
	///
	/// The inverse of this function is [`ParsedMethodSignature::write`].
	pub fn parse(&self) -> Result<ParsedMethodSignature> {
		let mut chars = self.as_inner().chars().peekable();

		let type_parameters = read_formal_type_parameters(&mut chars)
			.with_context(|| anyhow!("failed to read type parameters of method signature {self:?}"))?;

		if chars.next_if_eq(&'(').is_none() {
			bail!("method signature {self:?} doesn't start with '(' (after any type parameters)");
		}

		let mut parameter_types = Vec::new();
		loop {
			if chars.next_if_eq(&')').is_some() {
				break;
			}
			parameter_types.push(read_type_signature(&mut chars)
				.with_context(|| anyhow!("failed to read a parameter type of method signature {self:?}"))?);
		}

		let return_type = if chars.next_if_eq(&'V').is_some() {
			None
		} else {
			Some(read_type_signature(&mut chars)
				.with_context(|| anyhow!("failed to read return type of method signature {self:?}"))?)
		};

		let mut throws = Vec::new();
		while chars.next_if_eq(&'^').is_some() {
			let t = if chars.peek().copied() == Some(JavaCodePoint::from_char('T')) {
				chars.next();
				let name = read_identifier(&mut chars)?;
				if chars.next_if_eq(&';').is_none() {
					bail!("throws type variable signature doesn't end with ';'");
				}
				ThrowsSignature::TypeVariable(name)
			} else {
				ThrowsSignature::Class(read_class_type_signature(&mut chars)
					.with_context(|| anyhow!("failed to read a throws signature of method signature {self:?}"))?)
			};
			throws.push(t);
		}

		if chars.peek().is_some() {
			bail!("expected end of method signature {self:?}, got {:?} remaining", JavaString::from_iter(chars));
		}

		Ok(ParsedMethodSignature { type_parameters, parameter_types, return_type, throws })
	}
}

impl ParsedMethodSignature {
	/// Writes a method signature.
	///
	/// The inverse of this function is [`MethodSignatureSlice::parse`].
	pub fn write(&self) -> MethodSignature {
		let mut s = JavaString::new();
		write_formal_type_parameters(&self.type_parameters, &mut s);
		s.push('(');
		for parameter_type in &self.parameter_types {
			write_type_signature(parameter_type, &mut s);
		}
		s.push(')');
		if let Some(return_type) = &self.return_type {
			write_type_signature(return_type, &mut s);
		} else {
			s.push('V');
		}
		for t in &self.throws {
			s.push('^');
			match t {
				ThrowsSignature::Class(c) => write_class_type_signature(c, &mut s),
				ThrowsSignature::TypeVariable(name) => {
					s.push('T');
					s.push_java_str(name);
					s.push(';');
				},
			}
		}
		unsafe { MethodSignature::from_inner_unchecked(s) }
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use anyhow::Result;
	use crate::tree::class::ClassSignatureSlice;
	use crate::tree::field::FieldSignatureSlice;
	use crate::tree::method::MethodSignatureSlice;
	use crate::tree::signature::{ClassTypeSignature, FieldTypeSignature, ParsedClassSignature, ParsedFieldSignature, ParsedMethodSignature, TypeArgument, TypeSignature};
	use crate::tree::descriptor::Type;

	#[test]
	fn field_signature_simple() -> Result<()> {
		let sig = unsafe { FieldSignatureSlice::from_inner_unchecked("Ljava/util/List<Ljava/lang/String;>;".into()) };
		let parsed = sig.parse()?;
		assert_eq!(
			parsed,
			ParsedFieldSignature(FieldTypeSignature::Class(ClassTypeSignature {
				name: "java/util/List".into(),
				type_arguments: vec![TypeArgument::Exact(Box::new(FieldTypeSignature::Class(ClassTypeSignature {
					name: "java/lang/String".into(),
					type_arguments: vec![],
					suffix: vec![],
				})))],
				suffix: vec![],
			})),
		);
		assert_eq!(parsed.write().as_inner(), sig.as_inner());
		Ok(())
	}

	#[test]
	fn field_signature_type_variable() -> Result<()> {
		let sig = unsafe { FieldSignatureSlice::from_inner_unchecked("TE;".into()) };
		let parsed = sig.parse()?;
		assert_eq!(parsed, ParsedFieldSignature(FieldTypeSignature::TypeVariable("E".into())));
		assert_eq!(parsed.write().as_inner(), sig.as_inner());
		Ok(())
	}

	#[test]
	fn class_signature_with_type_parameters() -> Result<()> {
		let sig = unsafe { ClassSignatureSlice::from_inner_unchecked("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/List<TT;>;".into()) };
		let parsed = sig.parse()?;
		assert_eq!(parsed.type_parameters.len(), 1);
		assert_eq!(parsed.type_parameters[0].name, JavaString::from("T"));
		assert_eq!(parsed.super_interfaces.len(), 1);
		assert_eq!(parsed.write().as_inner(), sig.as_inner());
		Ok(())
	}

	#[test]
	fn method_signature_with_throws_and_generics() -> Result<()> {
		let sig = unsafe { MethodSignatureSlice::from_inner_unchecked("<T:Ljava/lang/Exception;>(Ljava/lang/String;)TT;^TT;".into()) };
		let parsed = sig.parse()?;
		assert_eq!(parsed.type_parameters.len(), 1);
		assert_eq!(parsed.parameter_types, vec![TypeSignature::Field(FieldTypeSignature::Class(ClassTypeSignature {
			name: "java/lang/String".into(),
			type_arguments: vec![],
			suffix: vec![],
		}))]);
		assert_eq!(parsed.return_type, Some(TypeSignature::Field(FieldTypeSignature::TypeVariable("T".into()))));
		assert_eq!(parsed.write().as_inner(), sig.as_inner());
		Ok(())
	}

	#[test]
	fn method_signature_array_and_primitive() -> Result<()> {
		let sig = unsafe { MethodSignatureSlice::from_inner_unchecked("([I)V".into()) };
		let parsed = sig.parse()?;
		assert_eq!(parsed.parameter_types, vec![TypeSignature::Array(1, Box::new(TypeSignature::Base(Type::I)))]);
		assert_eq!(parsed.return_type, None);
		assert_eq!(parsed.write().as_inner(), sig.as_inner());
		Ok(())
	}
}
