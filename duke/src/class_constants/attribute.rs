//! Attribute names, JVMS 4.7. Attribute names are UTF-8 constant pool entries, so these are
//! exposed as [`JavaStr`] constants for comparing against a decoded attribute name directly.

use java_string::JavaStr;

pub const CONSTANT_VALUE: &JavaStr = JavaStr::from_str("ConstantValue");
pub const CODE: &JavaStr = JavaStr::from_str("Code");
pub const STACK_MAP_TABLE: &JavaStr = JavaStr::from_str("StackMapTable");
pub const STACK_MAP: &JavaStr = JavaStr::from_str("StackMap");
pub const EXCEPTIONS: &JavaStr = JavaStr::from_str("Exceptions");
pub const INNER_CLASSES: &JavaStr = JavaStr::from_str("InnerClasses");
pub const ENCLOSING_METHOD: &JavaStr = JavaStr::from_str("EnclosingMethod");
pub const SYNTHETIC: &JavaStr = JavaStr::from_str("Synthetic");
pub const SIGNATURE: &JavaStr = JavaStr::from_str("Signature");
pub const SOURCE_FILE: &JavaStr = JavaStr::from_str("SourceFile");
pub const SOURCE_DEBUG_EXTENSION: &JavaStr = JavaStr::from_str("SourceDebugExtension");
pub const LINE_NUMBER_TABLE: &JavaStr = JavaStr::from_str("LineNumberTable");
pub const LOCAL_VARIABLE_TABLE: &JavaStr = JavaStr::from_str("LocalVariableTable");
pub const LOCAL_VARIABLE_TYPE_TABLE: &JavaStr = JavaStr::from_str("LocalVariableTypeTable");
pub const DEPRECATED: &JavaStr = JavaStr::from_str("Deprecated");
pub const RUNTIME_VISIBLE_ANNOTATIONS: &JavaStr = JavaStr::from_str("RuntimeVisibleAnnotations");
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &JavaStr = JavaStr::from_str("RuntimeInvisibleAnnotations");
pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &JavaStr = JavaStr::from_str("RuntimeVisibleParameterAnnotations");
pub const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &JavaStr = JavaStr::from_str("RuntimeInvisibleParameterAnnotations");
pub const RUNTIME_VISIBLE_TYPE_ANNOTATIONS: &JavaStr = JavaStr::from_str("RuntimeVisibleTypeAnnotations");
pub const RUNTIME_INVISIBLE_TYPE_ANNOTATIONS: &JavaStr = JavaStr::from_str("RuntimeInvisibleTypeAnnotations");
pub const ANNOTATION_DEFAULT: &JavaStr = JavaStr::from_str("AnnotationDefault");
pub const BOOTSTRAP_METHODS: &JavaStr = JavaStr::from_str("BootstrapMethods");
pub const METHOD_PARAMETERS: &JavaStr = JavaStr::from_str("MethodParameters");
pub const MODULE: &JavaStr = JavaStr::from_str("Module");
pub const MODULE_PACKAGES: &JavaStr = JavaStr::from_str("ModulePackages");
pub const MODULE_MAIN_CLASS: &JavaStr = JavaStr::from_str("ModuleMainClass");
pub const NEST_HOST: &JavaStr = JavaStr::from_str("NestHost");
pub const NEST_MEMBERS: &JavaStr = JavaStr::from_str("NestMembers");
pub const RECORD: &JavaStr = JavaStr::from_str("Record");
pub const PERMITTED_SUBCLASSES: &JavaStr = JavaStr::from_str("PermittedSubclasses");
