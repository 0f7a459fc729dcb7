#[cfg(test)]
mod type_tests {
    use crate::types::{BasicType, Primitives, ProcedureType, Type, WORD_SIZE};

    fn proc_type(parameters: Vec<Type>, return_type: Type) -> Type {
        let mut procedure = ProcedureType::new();
        for parameter in parameters {
            procedure.add_parameter(parameter);
        }
        procedure.set_return(return_type);
        Type::procedure(procedure)
    }

    #[test]
    fn primordial_sizes() {
        let prims = Primitives::new();
        assert_eq!(prims.int.size(), WORD_SIZE);
        assert_eq!(prims.string.size(), WORD_SIZE);
    }

    #[test]
    fn subtyping_is_reflexive() {
        let prims = Primitives::new();
        let array = Type::array(4, prims.int.clone());
        let procedure = proc_type(vec![prims.int.clone()], prims.int.clone());
        for ty in [&prims.int, &prims.string, &array, &procedure] {
            assert!(ty.is_subtype(ty), "{ty} should be a subtype of itself");
        }
    }

    #[test]
    fn primordials_are_unrelated() {
        let prims = Primitives::new();
        assert!(!prims.int.is_subtype(&prims.string));
        assert!(!prims.string.is_subtype(&prims.int));
    }

    #[test]
    fn nominal_identity_not_name_identity() {
        // Two basics called "int" from different families are distinct types.
        let a = Type::Basic(BasicType::new("int", WORD_SIZE));
        let b = Type::Basic(BasicType::new("int", WORD_SIZE));
        assert!(!a.is_subtype(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn basic_chain_walks_to_the_root() {
        // girl <: child <: person
        let person = BasicType::new("person", WORD_SIZE);
        let child = BasicType::subtype_of("child", WORD_SIZE, &person);
        let girl = BasicType::subtype_of("girl", WORD_SIZE, &child);

        let person = Type::basic(&person);
        let child = Type::basic(&child);
        let girl = Type::basic(&girl);

        assert!(girl.is_subtype(&child));
        assert!(girl.is_subtype(&person));
        assert!(child.is_subtype(&person));

        // Antisymmetry along the chain.
        assert!(!person.is_subtype(&child));
        assert!(!child.is_subtype(&girl));
        assert!(!person.is_subtype(&girl));
    }

    #[test]
    fn array_subtyping_needs_equal_shape() {
        let prims = Primitives::new();
        let four = Type::array(4, prims.int.clone());
        let four_again = Type::array(4, prims.int.clone());
        let five = Type::array(5, prims.int.clone());

        assert!(four.is_subtype(&four_again));
        assert_eq!(four, four_again);
        assert!(!four.is_subtype(&five));
        assert!(!five.is_subtype(&four));
    }

    #[test]
    fn array_size_is_count_times_element() {
        let prims = Primitives::new();
        assert_eq!(Type::array(4, prims.int.clone()).size(), 16);
        assert_eq!(Type::array(0, prims.int.clone()).size(), 0);
    }

    #[test]
    fn cross_kind_subtyping_is_false() {
        let prims = Primitives::new();
        let array = Type::array(4, prims.int.clone());
        let procedure = proc_type(vec![], prims.int.clone());
        assert!(!prims.int.is_subtype(&array));
        assert!(!array.is_subtype(&prims.int));
        assert!(!procedure.is_subtype(&prims.int));
        assert!(!prims.int.is_subtype(&procedure));
    }

    #[test]
    fn procedure_parameters_are_contravariant() {
        let person = BasicType::new("person", WORD_SIZE);
        let child = BasicType::subtype_of("child", WORD_SIZE, &person);
        let int = BasicType::new("int", WORD_SIZE);

        // A procedure over persons serves wherever one over children is wanted.
        let over_person = proc_type(vec![Type::basic(&person)], Type::basic(&int));
        let over_child = proc_type(vec![Type::basic(&child)], Type::basic(&int));

        assert!(over_person.is_subtype(&over_child));
        assert!(!over_child.is_subtype(&over_person));
    }

    #[test]
    fn procedure_returns_are_covariant() {
        let person = BasicType::new("person", WORD_SIZE);
        let child = BasicType::subtype_of("child", WORD_SIZE, &person);

        let returns_child = proc_type(vec![], Type::basic(&child));
        let returns_person = proc_type(vec![], Type::basic(&person));

        assert!(returns_child.is_subtype(&returns_person));
        assert!(!returns_person.is_subtype(&returns_child));
    }

    #[test]
    fn procedure_arity_must_match() {
        let prims = Primitives::new();
        let unary = proc_type(vec![prims.int.clone()], prims.int.clone());
        let binary = proc_type(
            vec![prims.int.clone(), prims.int.clone()],
            prims.int.clone(),
        );
        assert!(!unary.is_subtype(&binary));
        assert!(!binary.is_subtype(&unary));
    }

    #[test]
    fn subtyping_is_transitive_through_procedures() {
        let person = BasicType::new("person", WORD_SIZE);
        let child = BasicType::subtype_of("child", WORD_SIZE, &person);
        let girl = BasicType::subtype_of("girl", WORD_SIZE, &child);

        let returns_girl = proc_type(vec![], Type::basic(&girl));
        let returns_child = proc_type(vec![], Type::basic(&child));
        let returns_person = proc_type(vec![], Type::basic(&person));

        assert!(returns_girl.is_subtype(&returns_child));
        assert!(returns_child.is_subtype(&returns_person));
        assert!(returns_girl.is_subtype(&returns_person));
    }

    #[test]
    fn incremental_procedure_building() {
        let prims = Primitives::new();
        let mut procedure = ProcedureType::new();
        assert_eq!(procedure.arity(), 0);
        procedure.add_parameter(prims.int.clone());
        procedure.add_parameter(prims.string.clone());
        procedure.set_return(prims.int.clone());
        assert_eq!(procedure.arity(), 2);
        assert_eq!(procedure.parameter(0), &prims.int);
        assert_eq!(procedure.parameter(1), &prims.string);
        assert_eq!(procedure.return_type(), &prims.int);
    }

    #[test]
    #[should_panic(expected = "set twice")]
    fn return_type_is_set_once() {
        let prims = Primitives::new();
        let mut procedure = ProcedureType::new();
        procedure.set_return(prims.int.clone());
        procedure.set_return(prims.int.clone());
    }

    #[test]
    fn display_forms() {
        let prims = Primitives::new();
        assert_eq!(prims.int.to_string(), "int");
        assert_eq!(Type::array(4, prims.int.clone()).to_string(), "[4] int");
        let procedure = proc_type(
            vec![prims.int.clone(), prims.string.clone()],
            prims.int.clone(),
        );
        assert_eq!(procedure.to_string(), "proc (int, string) int");
    }
}
