pub mod drink;

pub use drink::{
    Drink, DrinkDraft, DrinkError, DrinkView, Ingredient, LongDrink, NewDrink, ShortDrink,
    ShortIngredient,
};
